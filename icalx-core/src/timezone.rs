//! VTIMEZONE transition tables (spec §4.5): the sorted concatenation of
//! `(DTSTART, TZOFFSETTO, TZNAME)` across a VTIMEZONE's STANDARD/DAYLIGHT
//! children, queried by "last transition whose time <= instant".

use chrono::NaiveDateTime;
use icalx_syntax::values::Value;

use crate::component::Component;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub starts_at: NaiveDateTime,
    pub offset_seconds: i32,
    pub name: Option<String>,
}

/// A precomputed, ascending transition table for one VTIMEZONE.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeZoneTable {
    pub tzid: String,
    transitions: Vec<Transition>,
}

impl TimeZoneTable {
    /// Builds the table from a VTIMEZONE's STANDARD/DAYLIGHT children.
    /// Non-conforming children (missing DTSTART/TZOFFSETTO) are skipped.
    pub fn from_component(component: &Component) -> Option<Self> {
        let tzid = match &component.get_property("TZID")?.value {
            Value::Text(values) => values.first()?.clone(),
            _ => return None,
        };

        let mut transitions: Vec<Transition> = component
            .get_children("STANDARD")
            .into_iter()
            .chain(component.get_children("DAYLIGHT"))
            .filter_map(transition_from_observance)
            .collect();

        transitions.sort_by_key(|t| t.starts_at);

        Some(TimeZoneTable { tzid, transitions })
    }

    /// The UTC offset in effect at `instant`: the last transition whose
    /// start is `<= instant`, or 0 before the earliest transition.
    pub fn offset_at(&self, instant: NaiveDateTime) -> i32 {
        self.transition_at(instant).map(|t| t.offset_seconds).unwrap_or(0)
    }

    /// The timezone abbreviation in effect at `instant`, or `"UTC"`
    /// before the earliest transition.
    pub fn abbreviation_at(&self, instant: NaiveDateTime) -> String {
        self.transition_at(instant)
            .and_then(|t| t.name.clone())
            .unwrap_or_else(|| "UTC".to_string())
    }

    fn transition_at(&self, instant: NaiveDateTime) -> Option<&Transition> {
        // `transitions` is sorted ascending; partition_point finds the
        // first transition strictly after `instant`, so the one before
        // it (if any) is the applicable one. O(log n) per spec §4.5.
        let idx = self.transitions.partition_point(|t| t.starts_at <= instant);
        idx.checked_sub(1).map(|i| &self.transitions[i])
    }
}

fn transition_from_observance(observance: &Component) -> Option<Transition> {
    let starts_at = match &observance.get_property("DTSTART")?.value {
        Value::DateTime(dt) => dt.naive(),
        Value::Date(date) => date.and_hms_opt(0, 0, 0)?,
        _ => return None,
    };

    let offset_seconds = match &observance.get_property("TZOFFSETTO")?.value {
        Value::UtcOffset(seconds) => *seconds,
        _ => return None,
    };

    let name = observance.get_property("TZNAME").and_then(|p| match &p.value {
        Value::Text(values) => values.first().cloned(),
        _ => None,
    });

    Some(Transition { starts_at, offset_seconds, name })
}
