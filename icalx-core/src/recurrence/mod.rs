//! The recurrence engine (spec §4.7): turns a component's DTSTART, its
//! `RRULE`s, `EXDATE`s, and `RDATE`s into a lazy, chronologically ordered
//! stream of [`Occurrence`]s.

pub mod engine;
pub mod merge;
pub mod rule;

pub use engine::RuleIter;
pub use merge::{ExceptionMatch, Occurrence, OccurrenceIter, RecurrenceInput};
pub use rule::{ByDayItem, Frequency, RecurRule};

use chrono::{Duration as ChronoDuration, NaiveDateTime};

use crate::component::{Component, ComponentKind};
use crate::error::ModelError;
use icalx_syntax::values::{Value, ValueKind};

/// Reads DTSTART/RRULE/EXDATE/RDATE off a component and builds the
/// engine's input view (§3). Fails if DTSTART is missing, since nothing
/// can be expanded without an anchor.
pub fn recurrence_input(component: &Component, range_end: Option<NaiveDateTime>) -> Result<RecurrenceInput, ModelError> {
    let dtstart = component
        .get_property("DTSTART")
        .ok_or(ModelError::MissingDtStart)?
        .value
        .clone();

    let dtstart_naive = match &dtstart {
        Value::DateTime(dt) => dt.naive(),
        Value::Date(date) => date.and_hms_opt(0, 0, 0).unwrap(),
        _ => return Err(ModelError::MissingDtStart),
    };

    let rules: Vec<RecurRule> = component
        .get_all_properties("RRULE")
        .into_iter()
        .filter_map(|prop| match &prop.value {
            Value::Recur(rule) => Some(rule.clone()),
            _ => None,
        })
        .collect();

    let mut exdates = Vec::new();
    for prop in component.get_all_properties("EXDATE") {
        let is_date_only = prop.declared_kind() == Some(ValueKind::Date);
        for value in prop.values(true, None).unwrap_or_default() {
            match value {
                Value::DateTime(dt) if !is_date_only => exdates.push(ExceptionMatch::Exact(dt.naive())),
                Value::Date(date) => exdates.push(ExceptionMatch::DateOnly(date)),
                Value::DateTime(dt) => exdates.push(ExceptionMatch::DateOnly(dt.naive().date())),
                _ => {}
            }
        }
    }

    let mut rdates = Vec::new();
    for prop in component.get_all_properties("RDATE") {
        for value in prop.values(true, None).unwrap_or_default() {
            match value {
                Value::DateTime(dt) => rdates.push(dt.naive()),
                Value::Date(date) => rdates.push(date.and_hms_opt(0, 0, 0).unwrap()),
                Value::Period(period) => rdates.push(period.start.naive()),
                _ => {}
            }
        }
    }

    if range_end.is_none() && rules.iter().any(|rule| !rule.has_bounded_end()) {
        return Err(ModelError::UnboundedRecurrenceWithoutRangeEnd);
    }

    Ok(RecurrenceInput {
        dtstart: dtstart_naive,
        rules,
        exdates,
        rdates,
        range_end,
    })
}

/// The per-occurrence offset from DTSTART to its end, per component kind
/// (§4.7's "end computation"): VEVENT honors DTEND or DURATION, VTODO
/// honors DUE or DURATION, VJOURNAL has no end at all.
fn end_offset(component: &Component) -> Option<ChronoDuration> {
    match component.kind {
        ComponentKind::VEvent => end_property_offset(component, "DTSTART", "DTEND"),
        ComponentKind::VTodo => end_property_offset(component, "DTSTART", "DUE"),
        _ => None,
    }
}

fn end_property_offset(component: &Component, start_name: &str, end_name: &str) -> Option<ChronoDuration> {
    let start = naive_of(component.get_property(start_name)?.value.clone())?;

    if let Some(end_prop) = component.get_property(end_name) {
        let end = naive_of(end_prop.value.clone())?;
        return Some(end - start);
    }

    if let Some(duration_prop) = component.get_property("DURATION") {
        if let Value::Duration(duration) = &duration_prop.value {
            return Some(ChronoDuration::seconds(duration.total_seconds()));
        }
    }

    None
}

fn naive_of(value: Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(dt.naive()),
        Value::Date(date) => date.and_hms_opt(0, 0, 0),
        _ => None,
    }
}

/// Expands a component's recurrence into occurrences, filling in `end`
/// per component kind on top of the bare start times `OccurrenceIter`
/// produces.
pub fn expand(component: &Component, range_end: Option<NaiveDateTime>) -> Result<Vec<Occurrence>, ModelError> {
    let input = recurrence_input(component, range_end)?;
    let offset = end_offset(component);

    Ok(OccurrenceIter::new(input)
        .map(|occurrence| Occurrence {
            end: offset.map(|delta| occurrence.start + delta),
            ..occurrence
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use icalx_syntax::content_line::ContentLineParams;

    fn component_with(properties: &[(&str, &str)]) -> Component {
        let mut component = Component::new(ComponentKind::VEvent);
        for (name, raw) in properties {
            let kind = crate::property::default_kind_for_property(name);
            let value = Value::parse(raw, kind, None, true, None).unwrap();
            component.add_property(Property {
                name: name.to_string(),
                params: ContentLineParams::default(),
                raw_value: raw.to_string(),
                value,
            });
        }
        component
    }

    #[test]
    fn expands_daily_event_with_dtend() {
        let component = component_with(&[
            ("DTSTART", "20240101T090000Z"),
            ("DTEND", "20240101T100000Z"),
            ("RRULE", "FREQ=DAILY;COUNT=2"),
        ]);

        let occurrences = expand(&component, None).unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].end, Some(occurrences[0].start + ChronoDuration::hours(1)));
    }

    #[test]
    fn unbounded_rrule_without_range_end_is_rejected() {
        let component = component_with(&[("DTSTART", "20240101T090000Z"), ("RRULE", "FREQ=DAILY")]);
        assert!(matches!(expand(&component, None), Err(ModelError::UnboundedRecurrenceWithoutRangeEnd)));
    }

    #[test]
    fn missing_dtstart_is_rejected() {
        let component = Component::new(ComponentKind::VEvent);
        assert!(matches!(expand(&component, None), Err(ModelError::MissingDtStart)));
    }
}
