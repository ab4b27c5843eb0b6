//! The validator (spec §4.6): runs bottom-up over a finished component
//! tree and returns `ValidationFinding`s rather than failing the parse --
//! structural problems are reported, not fatal, except where the caller
//! chooses to treat ERROR/FATAL findings as failures.

use std::collections::HashSet;

use icalx_syntax::values::{Value, ValueKind};

use crate::component::{Component, ComponentKind};
use crate::error::{Severity, ValidationFinding};
use crate::property::Property;

/// Runs every check in this module over `root` and its descendants,
/// returning every finding in tree order.
pub fn validate(root: &Component) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let known_tzids = collect_tzids(root);

    validate_component(root, &known_tzids, &mut findings);
    resolve_styled_description(root, &mut findings);

    findings
}

fn collect_tzids(component: &Component) -> HashSet<String> {
    let mut tzids = HashSet::new();
    collect_tzids_into(component, &mut tzids);
    tzids
}

fn collect_tzids_into(component: &Component, tzids: &mut HashSet<String>) {
    if component.kind == ComponentKind::VTimeZone {
        if let Some(tzid) = component.get_property("TZID") {
            if let Value::Text(values) = &tzid.value {
                if let Some(first) = values.first() {
                    tzids.insert(first.clone());
                }
            }
        }
    }
    for child in component.children() {
        collect_tzids_into(child, tzids);
    }
}

fn validate_component(component: &Component, known_tzids: &HashSet<String>, findings: &mut Vec<ValidationFinding>) {
    check_required_properties(component, findings);
    check_mutual_exclusion(component, findings);
    check_enumerated_values(component, findings);
    check_date_kind_mixing(component, findings);
    check_tzid_references(component, known_tzids, findings);
    check_rrules(component, findings);
    check_valarm_conditionals(component, findings);

    for child in component.children() {
        validate_component(child, known_tzids, findings);
    }
}

fn missing(component: &Component, property: &str) -> ValidationFinding {
    ValidationFinding::new(
        "ICAL-VALID-001",
        format!("{} is required on {}", property, component.kind.name()),
        component.kind.name(),
        Severity::Error,
    )
    .with_property(property)
}

fn check_required_properties(component: &Component, findings: &mut Vec<ValidationFinding>) {
    let required: &[&str] = match component.kind {
        ComponentKind::VCalendar => &["PRODID", "VERSION"],
        ComponentKind::VEvent | ComponentKind::VTodo | ComponentKind::VJournal | ComponentKind::VFreeBusy => &["DTSTAMP", "UID"],
        ComponentKind::VTimeZone => &["TZID"],
        ComponentKind::Standard | ComponentKind::Daylight => &["DTSTART", "TZOFFSETFROM", "TZOFFSETTO"],
        ComponentKind::VAlarm => &["ACTION", "TRIGGER"],
        _ => &[],
    };

    for name in required {
        if component.get_property(name).is_none() {
            findings.push(missing(component, name));
        }
    }

    if component.kind == ComponentKind::VTimeZone {
        let has_observance = component.get_children("STANDARD").into_iter().chain(component.get_children("DAYLIGHT")).count() > 0;
        if !has_observance {
            findings.push(ValidationFinding::new(
                "ICAL-VALID-001",
                "VTIMEZONE requires at least one STANDARD or DAYLIGHT child",
                component.kind.name(),
                Severity::Error,
            ));
        }
    }
}

fn check_mutual_exclusion(component: &Component, findings: &mut Vec<ValidationFinding>) {
    let pair = match component.kind {
        ComponentKind::VEvent => Some(("DTEND", "DURATION")),
        ComponentKind::VTodo => Some(("DUE", "DURATION")),
        _ => None,
    };

    if let Some((a, b)) = pair {
        if component.get_property(a).is_some() && component.get_property(b).is_some() {
            findings.push(
                ValidationFinding::new(
                    "ICAL-VALID-002",
                    format!("{a} and {b} are mutually exclusive on {}", component.kind.name()),
                    component.kind.name(),
                    Severity::Error,
                )
                .with_property(a),
            );
        }
    }
}

fn check_enumerated_values(component: &Component, findings: &mut Vec<ValidationFinding>) {
    let status_values: &[&str] = match component.kind {
        ComponentKind::VEvent => &["TENTATIVE", "CONFIRMED", "CANCELLED"],
        ComponentKind::VTodo => &["NEEDS-ACTION", "COMPLETED", "IN-PROCESS", "CANCELLED"],
        ComponentKind::VJournal => &["DRAFT", "FINAL", "CANCELLED"],
        _ => &[],
    };
    if !status_values.is_empty() {
        check_text_enum(component, "STATUS", status_values, findings);
    }

    if component.kind == ComponentKind::VAlarm {
        check_text_enum(component, "ACTION", &["AUDIO", "DISPLAY", "EMAIL"], findings);
    }

    if component.kind == ComponentKind::VFreeBusy {
        for prop in component.get_all_properties("FREEBUSY") {
            if let Some(fbtype) = prop.params.get("FBTYPE") {
                if !["FREE", "BUSY", "BUSY-UNAVAILABLE", "BUSY-TENTATIVE"].contains(&fbtype.to_ascii_uppercase().as_str()) {
                    findings.push(
                        ValidationFinding::new(
                            "ICAL-VALID-003",
                            format!("FBTYPE={fbtype} is not a recognized value"),
                            component.kind.name(),
                            Severity::Error,
                        )
                        .with_property("FREEBUSY"),
                    );
                }
            }
        }
    }

    if component.kind == ComponentKind::VTodo {
        check_integer_range(component, "PRIORITY", 0, 9, findings);
        check_integer_range(component, "PERCENT-COMPLETE", 0, 100, findings);
    }
}

fn check_text_enum(component: &Component, property: &str, allowed: &[&str], findings: &mut Vec<ValidationFinding>) {
    let Some(prop) = component.get_property(property) else { return };
    let Value::Text(values) = &prop.value else { return };
    let Some(actual) = values.first() else { return };

    if !allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(actual)) {
        findings.push(
            ValidationFinding::new(
                "ICAL-VALID-003",
                format!("{property}={actual} is not one of {allowed:?} on {}", component.kind.name()),
                component.kind.name(),
                Severity::Error,
            )
            .with_property(property),
        );
    }
}

fn check_integer_range(component: &Component, property: &str, min: i64, max: i64, findings: &mut Vec<ValidationFinding>) {
    let Some(prop) = component.get_property(property) else { return };
    let Value::Integer(value) = &prop.value else { return };

    if *value < min || *value > max {
        findings.push(
            ValidationFinding::new(
                "ICAL-VALID-004",
                format!("{property}={value} is outside [{min}, {max}] on {}", component.kind.name()),
                component.kind.name(),
                Severity::Error,
            )
            .with_property(property),
        );
    }
}

fn check_date_kind_mixing(component: &Component, findings: &mut Vec<ValidationFinding>) {
    if component.kind != ComponentKind::VEvent {
        return;
    }

    let (Some(dtstart), Some(dtend)) = (component.get_property("DTSTART"), component.get_property("DTEND")) else {
        return;
    };

    if dtstart.value.kind() != dtend.value.kind() {
        findings.push(
            ValidationFinding::new(
                "ICAL-VALID-005",
                "DTSTART and DTEND must be the same value kind (both DATE or both DATE-TIME)",
                component.kind.name(),
                Severity::Error,
            )
            .with_property("DTEND"),
        );
    }
}

fn check_tzid_references(component: &Component, known_tzids: &HashSet<String>, findings: &mut Vec<ValidationFinding>) {
    for prop in component.properties() {
        if let Some(tzid) = prop.tzid() {
            if !known_tzids.contains(tzid) {
                findings.push(
                    ValidationFinding::new(
                        "ICAL-VALID-006",
                        format!("TZID={tzid} has no matching VTIMEZONE in this calendar"),
                        component.kind.name(),
                        Severity::Warning,
                    )
                    .with_property(&prop.name),
                );
            }
        }
    }
}

fn check_rrules(component: &Component, findings: &mut Vec<ValidationFinding>) {
    for prop in component.get_all_properties("RRULE") {
        let Value::Recur(rule) = &prop.value else { continue };

        if rule.interval < 1 {
            findings.push(
                ValidationFinding::new("ICAL-VALID-007", "RRULE INTERVAL must be >= 1", component.kind.name(), Severity::Error)
                    .with_property("RRULE"),
            );
        }
        if rule.count.is_some() && rule.until.is_some() {
            findings.push(
                ValidationFinding::new(
                    "ICAL-VALID-007",
                    "RRULE COUNT and UNTIL are mutually exclusive",
                    component.kind.name(),
                    Severity::Error,
                )
                .with_property("RRULE"),
            );
        }
        if let Some(until) = &rule.until {
            if until.tzid().is_some() {
                findings.push(
                    ValidationFinding::new(
                        "ICAL-VALID-007",
                        "RRULE UNTIL must be a DATE or UTC DATE-TIME, not a zoned local time",
                        component.kind.name(),
                        Severity::Error,
                    )
                    .with_property("RRULE"),
                );
            }
        }
    }
}

fn check_valarm_conditionals(component: &Component, findings: &mut Vec<ValidationFinding>) {
    if component.kind != ComponentKind::VAlarm {
        return;
    }

    let Some(action) = component.get_property("ACTION") else { return };
    let Value::Text(values) = &action.value else { return };
    let Some(action_name) = values.first().map(|s| s.to_ascii_uppercase()) else { return };

    match action_name.as_str() {
        "DISPLAY" => {
            if component.get_property("DESCRIPTION").is_none() {
                findings.push(missing(component, "DESCRIPTION"));
            }
        }
        "EMAIL" => {
            for required in ["SUMMARY", "DESCRIPTION", "ATTENDEE"] {
                if component.get_property(required).is_none() {
                    findings.push(missing(component, required));
                }
            }
        }
        _ => {}
    }

    let has_repeat = component.get_property("REPEAT").is_some();
    let has_duration = component.get_property("DURATION").is_some();
    if has_repeat != has_duration {
        findings.push(
            ValidationFinding::new(
                "ICAL-VALID-002",
                "VALARM REPEAT and DURATION must be set together or not at all",
                component.kind.name(),
                Severity::Error,
            )
            .with_property("REPEAT"),
        );
    }
}

/// RFC 9073: when `STYLED-DESCRIPTION` is present, plain `DESCRIPTION` is
/// suppressed unless marked `DERIVED=TRUE`. The underlying property is
/// left in place (§3: properties live until the root is dropped); this
/// just records that `effective_description` should skip it.
pub fn resolve_styled_description(root: &Component, findings: &mut Vec<ValidationFinding>) {
    walk_styled_description(root, findings);
}

fn walk_styled_description(component: &Component, findings: &mut Vec<ValidationFinding>) {
    if component.get_property("STYLED-DESCRIPTION").is_some() {
        if let Some(description) = component.get_property("DESCRIPTION") {
            let derived = description.params.get("DERIVED").map(|v| v.eq_ignore_ascii_case("TRUE")).unwrap_or(false);
            if !derived {
                findings.push(
                    ValidationFinding::new(
                        "ICAL-VALID-008",
                        "DESCRIPTION is suppressed in favor of STYLED-DESCRIPTION",
                        component.kind.name(),
                        Severity::Warning,
                    )
                    .with_property("DESCRIPTION"),
                );
            }
        }
    }

    for child in component.children() {
        walk_styled_description(child, findings);
    }
}

/// The effective `DESCRIPTION` honoring the STYLED-DESCRIPTION
/// suppression rule above, for callers that just want the text.
pub fn effective_description(component: &Component) -> Option<&Property> {
    let description = component.get_property("DESCRIPTION")?;

    if component.get_property("STYLED-DESCRIPTION").is_some() {
        let derived = description.params.get("DERIVED").map(|v| v.eq_ignore_ascii_case("TRUE")).unwrap_or(false);
        if !derived {
            return None;
        }
    }

    Some(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalx_syntax::content_line::parse_lines;

    fn validate_lines(lines: &[&str]) -> Vec<ValidationFinding> {
        let logical: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let parsed = parse_lines(&logical, true).unwrap();
        let root = crate::component::assemble(&parsed, true, &icalx_syntax::security::SecurityGate::default()).unwrap().0;
        validate(&root)
    }

    #[test]
    fn missing_required_property_is_reported() {
        let findings = validate_lines(&["BEGIN:VCALENDAR", "VERSION:2.0", "END:VCALENDAR"]);
        assert!(findings.iter().any(|f| f.code == "ICAL-VALID-001" && f.property.as_deref() == Some("PRODID")));
    }

    #[test]
    fn dtend_and_duration_together_is_rejected() {
        let findings = validate_lines(&[
            "BEGIN:VEVENT",
            "UID:1",
            "DTSTAMP:20240101T000000Z",
            "DTSTART:20240101T090000Z",
            "DTEND:20240101T100000Z",
            "DURATION:PT1H",
            "END:VEVENT",
        ]);
        assert!(findings.iter().any(|f| f.code == "ICAL-VALID-002"));
    }

    #[test]
    fn unknown_status_value_is_rejected() {
        let findings = validate_lines(&[
            "BEGIN:VEVENT",
            "UID:1",
            "DTSTAMP:20240101T000000Z",
            "DTSTART:20240101T090000Z",
            "STATUS:BOGUS",
            "END:VEVENT",
        ]);
        assert!(findings.iter().any(|f| f.code == "ICAL-VALID-003"));
    }

    #[test]
    fn unresolved_tzid_reference_is_a_warning() {
        let findings = validate_lines(&[
            "BEGIN:VEVENT",
            "UID:1",
            "DTSTAMP:20240101T000000Z",
            "DTSTART;TZID=Europe/London:20240101T090000",
            "END:VEVENT",
        ]);
        let finding = findings.iter().find(|f| f.code == "ICAL-VALID-006").unwrap();
        assert_eq!(finding.severity, Severity::Warning);
    }

    #[test]
    fn styled_description_suppresses_plain_description() {
        let findings = validate_lines(&[
            "BEGIN:VEVENT",
            "UID:1",
            "DTSTAMP:20240101T000000Z",
            "DTSTART:20240101T090000Z",
            "DESCRIPTION:plain",
            "STYLED-DESCRIPTION;FMTTYPE=text/html:<p>styled</p>",
            "END:VEVENT",
        ]);
        assert!(findings.iter().any(|f| f.code == "ICAL-VALID-008"));
    }
}
