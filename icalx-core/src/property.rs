//! The generic `Property` (spec §3): `(name, parameters, value)`. One type
//! covers every iCalendar property rather than the teacher's ~70 per-name
//! structs (`redical_ical::properties::*`) — see DESIGN.md for why that
//! generalization is grounded in the teacher's own per-kind `ValueCodec`
//! dispatch rather than its per-property file layout.

use icalx_syntax::content_line::{ContentLine, ContentLineParams};
use icalx_syntax::security::SecurityGate;
use icalx_syntax::values::{Value, ValueKind};
use icalx_syntax::SyntaxError;

/// The default value kind for a property name when no `VALUE=` parameter
/// overrides it (RFC 5545 §3.8's per-property "Value Type" table, trimmed
/// to the properties this workspace's components recognize).
pub fn default_kind_for_property(name: &str) -> ValueKind {
    match name {
        "DTSTART" | "DTEND" | "DUE" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "COMPLETED" | "RECURRENCE-ID"
        | "RDATE" | "EXDATE" => ValueKind::DateTime,
        "DURATION" | "TRIGGER" | "REFRESH-INTERVAL" => ValueKind::Duration,
        "FREEBUSY" => ValueKind::Period,
        "TZOFFSETFROM" | "TZOFFSETTO" => ValueKind::UtcOffset,
        "RRULE" | "EXRULE" => ValueKind::Recur,
        "ATTENDEE" | "ORGANIZER" => ValueKind::CalAddress,
        "URL" | "ATTACH" | "TZURL" | "SOURCE" => ValueKind::Uri,
        "PERCENT-COMPLETE" | "PRIORITY" | "SEQUENCE" | "REPEAT" => ValueKind::Integer,
        _ => ValueKind::Text,
    }
}

/// A parsed property: name, ordered parameters, and the codec-decoded
/// value for the *declared or inferred* kind (§3's "the declared kind is
/// authoritative"). `raw_value` is kept for re-parsing as a list (RDATE,
/// EXDATE: "each possibly comma-separated", §3) without re-running the
/// content-line parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub params: ContentLineParams,
    pub raw_value: String,
    pub value: Value,
}

impl Property {
    pub fn declared_kind(&self) -> Option<ValueKind> {
        self.params.get("VALUE").and_then(ValueKind::from_param_str)
    }

    pub fn tzid(&self) -> Option<&str> {
        self.params.get("TZID")
    }

    /// Parses a content line into a `Property`, using the `VALUE=`
    /// parameter when present and otherwise `default_kind_for_property`.
    /// A `VALUE=` parameter that doesn't actually fit the value raises
    /// `TypeDeclarationMismatch` in strict mode; in lenient mode the
    /// mismatch is downgraded to a warning and the property falls back to
    /// its normally-inferred kind (§3's invariant).
    pub fn from_content_line(
        line: ContentLine,
        strict: bool,
        gate: Option<&SecurityGate>,
    ) -> Result<(Self, Vec<SyntaxError>), SyntaxError> {
        let declared = ValueKind::from_param_str(line.params.get("VALUE").unwrap_or(""));
        let kind = declared.unwrap_or_else(|| default_kind_for_property(&line.name));
        let tzid = line.params.get("TZID");

        let (value, warnings) = match Value::parse_with_warnings(&line.raw_value, kind, tzid, strict, gate) {
            Ok(result) => result,
            Err(err) if declared.is_some() => {
                let mismatch = SyntaxError::TypeDeclarationMismatch {
                    line: 0,
                    message: format!("{}: {}", line.name, err),
                };

                if strict {
                    return Err(mismatch);
                }

                let fallback_kind = default_kind_for_property(&line.name);
                let (value, mut warnings) = Value::parse_with_warnings(&line.raw_value, fallback_kind, tzid, strict, gate)?;
                warnings.push(mismatch);
                (value, warnings)
            }
            Err(err) => return Err(err),
        };

        Ok((
            Property {
                name: line.name,
                params: line.params,
                raw_value: line.raw_value,
                value,
            },
            warnings,
        ))
    }

    /// Re-parses `raw_value` as a comma-separated list of values of this
    /// property's kind. Used by RDATE/EXDATE/FREEBUSY consumers; for
    /// every other kind this just returns the single already-parsed value
    /// (TEXT already carries its own list inside `Value::Text`).
    pub fn values(&self, strict: bool, gate: Option<&SecurityGate>) -> Result<Vec<Value>, SyntaxError> {
        let kind = self.value.kind();

        match kind {
            ValueKind::Text => Ok(vec![self.value.clone()]),
            ValueKind::DateTime | ValueKind::Date | ValueKind::Period => self
                .raw_value
                .split(',')
                .map(|part| Value::parse(part, kind, self.tzid(), strict, gate))
                .collect(),
            _ => Ok(vec![self.value.clone()]),
        }
    }

    pub fn render(&self) -> ContentLine {
        ContentLine::new(self.name.clone(), self.params.clone(), self.value.format())
    }
}
