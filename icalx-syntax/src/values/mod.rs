//! The typed value layer (spec §4.3): one module per value kind, each
//! exposing a `parse`/`format` pair, plus the [`Value`] sum type that
//! dispatches to them by [`ValueKind`]. This is the crate's ValueCodec.

pub mod binary;
pub mod boolean;
pub mod cal_address;
pub mod date;
pub mod date_time;
pub mod duration;
pub mod float;
pub mod integer;
pub mod period;
pub mod recur;
pub mod text;
pub mod time;
pub mod uri;
pub mod utc_offset;

pub use date::Date;
pub use date_time::DateTimeValue;
pub use duration::DurationValue;
pub use period::PeriodValue;
pub use recur::RecurRule;
pub use time::TimeValue;

use crate::error::SyntaxError;
use crate::security::SecurityGate;

/// The declared or inferred kind of a property's value (§3 "the declared
/// kind is authoritative").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Date,
    DateTime,
    Time,
    Duration,
    Period,
    UtcOffset,
    Text,
    Binary,
    Boolean,
    Integer,
    Float,
    Uri,
    CalAddress,
    Recur,
}

impl ValueKind {
    pub fn as_param_str(&self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::DateTime => "DATE-TIME",
            Self::Time => "TIME",
            Self::Duration => "DURATION",
            Self::Period => "PERIOD",
            Self::UtcOffset => "UTC-OFFSET",
            Self::Text => "TEXT",
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Uri => "URI",
            Self::CalAddress => "CAL-ADDRESS",
            Self::Recur => "RECUR",
        }
    }

    pub fn from_param_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DATE" => Some(Self::Date),
            "DATE-TIME" => Some(Self::DateTime),
            "TIME" => Some(Self::Time),
            "DURATION" => Some(Self::Duration),
            "PERIOD" => Some(Self::Period),
            "UTC-OFFSET" => Some(Self::UtcOffset),
            "TEXT" => Some(Self::Text),
            "BINARY" => Some(Self::Binary),
            "BOOLEAN" => Some(Self::Boolean),
            "INTEGER" => Some(Self::Integer),
            "FLOAT" => Some(Self::Float),
            "URI" => Some(Self::Uri),
            "CAL-ADDRESS" => Some(Self::CalAddress),
            "RECUR" => Some(Self::Recur),
            _ => None,
        }
    }
}

/// A parsed property value. Each variant carries its decoded Rust form;
/// [`Value::raw`] reconstructs the normalized wire text on demand rather
/// than storing it redundantly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Date(Date),
    DateTime(DateTimeValue),
    Time(TimeValue),
    Duration(DurationValue),
    Period(PeriodValue),
    UtcOffset(i32),
    Text(Vec<String>),
    Binary(Vec<u8>),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Uri(String),
    CalAddress(String),
    Recur(RecurRule),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Date(_) => ValueKind::Date,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Time(_) => ValueKind::Time,
            Self::Duration(_) => ValueKind::Duration,
            Self::Period(_) => ValueKind::Period,
            Self::UtcOffset(_) => ValueKind::UtcOffset,
            Self::Text(_) => ValueKind::Text,
            Self::Binary(_) => ValueKind::Binary,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Uri(_) => ValueKind::Uri,
            Self::CalAddress(_) => ValueKind::CalAddress,
            Self::Recur(_) => ValueKind::Recur,
        }
    }

    /// Parses `raw` as `kind`. `tzid` supplies a `TZID=` parameter value
    /// for DATE-TIME/TIME parsing. `gate` enforces the URI policy for
    /// URI/CAL-ADDRESS kinds when present.
    pub fn parse(
        raw: &str,
        kind: ValueKind,
        tzid: Option<&str>,
        strict: bool,
        gate: Option<&SecurityGate>,
    ) -> Result<Self, SyntaxError> {
        match kind {
            ValueKind::Date => date::parse(raw).map(Value::Date),
            ValueKind::DateTime => date_time::parse(raw, tzid, strict).map(Value::DateTime),
            ValueKind::Time => time::parse(raw).map(Value::Time),
            ValueKind::Duration => duration::parse(raw).map(Value::Duration),
            ValueKind::Period => period::parse(raw).map(Value::Period),
            ValueKind::UtcOffset => utc_offset::parse(raw, strict).map(Value::UtcOffset),
            ValueKind::Text => Ok(Value::Text(text::parse_list(raw))),
            ValueKind::Binary => binary::parse(raw).map(Value::Binary),
            ValueKind::Boolean => boolean::parse(raw).map(Value::Boolean),
            ValueKind::Integer => integer::parse(raw).map(Value::Integer),
            ValueKind::Float => float::parse(raw).map(Value::Float),
            ValueKind::Uri => {
                if let Some(gate) = gate {
                    gate.validate_uri(raw)?;
                }
                Ok(Value::Uri(raw.to_string()))
            }
            ValueKind::CalAddress => {
                let normalized = cal_address::parse(raw);
                if let Some(gate) = gate {
                    gate.validate_uri(&normalized)?;
                }
                Ok(Value::CalAddress(normalized))
            }
            ValueKind::Recur => recur::parse(raw).map(Value::Recur),
        }
    }

    /// Like [`Value::parse`], but recovers the warning spec §7 requires
    /// when a lenient parse only succeeded via a kind's fallback path
    /// (currently only DATE-TIME has one; every other kind's `parse`
    /// either succeeds outright or fails outright, so it carries no
    /// warning to collect).
    pub fn parse_with_warnings(
        raw: &str,
        kind: ValueKind,
        tzid: Option<&str>,
        strict: bool,
        gate: Option<&SecurityGate>,
    ) -> Result<(Self, Vec<SyntaxError>), SyntaxError> {
        if kind == ValueKind::DateTime {
            let (value, warning) = date_time::parse_with_warning(raw, tzid, strict)?;
            return Ok((Value::DateTime(value), warning.into_iter().collect()));
        }

        Self::parse(raw, kind, tzid, strict, gate).map(|value| (value, Vec::new()))
    }

    pub fn format(&self) -> String {
        match self {
            Self::Date(v) => date::format(v),
            Self::DateTime(v) => date_time::format(v),
            Self::Time(v) => time::format(v),
            Self::Duration(v) => duration::format(v),
            Self::Period(v) => period::format(v),
            Self::UtcOffset(v) => utc_offset::format(*v),
            Self::Text(v) => text::format_list(v),
            Self::Binary(v) => binary::format(v),
            Self::Boolean(v) => boolean::format(*v),
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => float::format(*v),
            Self::Uri(v) => v.clone(),
            Self::CalAddress(v) => cal_address::format(v),
            Self::Recur(v) => recur::format(v),
        }
    }
}
