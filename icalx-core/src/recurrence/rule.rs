//! Re-exports and small helpers around the parsed RRULE record (spec
//! §4.7's "RRule representation"). The record itself lives in
//! `icalx_syntax::values::recur` (it's a value kind, §4.3); this module
//! only adds the engine-facing glue.

use chrono::NaiveDateTime;

pub use icalx_syntax::values::recur::{ByDayItem, Frequency, RecurRule};

/// `UNTIL`, converted to a naive instant in DTSTART's frame. The spec
/// requires UNTIL be DATE or DATE-TIME-UTC (validated elsewhere); here we
/// just read whichever naive instant the value carries.
pub fn until_naive(rule: &RecurRule) -> Option<NaiveDateTime> {
    rule.until.as_ref().map(|value| value.naive())
}

/// The safety bound the spec names for unbounded sub-day/day rules (§4.7
/// "Per-FREQ specifics"): 100 years from DTSTART for DAILY and slower,
/// 10 years for SECONDLY/MINUTELY/HOURLY.
pub fn safety_horizon(dtstart: NaiveDateTime, freq: Frequency) -> NaiveDateTime {
    let years = match freq {
        Frequency::Secondly | Frequency::Minutely | Frequency::Hourly => 10,
        _ => 100,
    };

    dtstart
        .checked_add_months(chrono::Months::new(years * 12))
        .unwrap_or(NaiveDateTime::MAX)
}
