//! PERIOD: `start/end` or `start/duration`.

use crate::error::SyntaxError;
use crate::values::date_time::{self, DateTimeValue};
use crate::values::duration::{self, DurationValue};

#[derive(Debug, Clone, PartialEq)]
pub enum PeriodEnd {
    Explicit(DateTimeValue),
    Duration(DurationValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodValue {
    pub start: DateTimeValue,
    pub end: PeriodEnd,
}

pub fn parse(raw: &str) -> Result<PeriodValue, SyntaxError> {
    let (start_raw, end_raw) = raw.split_once('/').ok_or_else(|| invalid(raw))?;

    let start = date_time::parse_strict(start_raw, None).map_err(|_| invalid(raw))?;

    let end = if end_raw.starts_with('P') || end_raw.starts_with("-P") {
        PeriodEnd::Duration(duration::parse(end_raw).map_err(|_| invalid(raw))?)
    } else {
        PeriodEnd::Explicit(date_time::parse_strict(end_raw, None).map_err(|_| invalid(raw))?)
    };

    Ok(PeriodValue { start, end })
}

pub fn format(value: &PeriodValue) -> String {
    let end = match &value.end {
        PeriodEnd::Explicit(dt) => date_time::format(dt),
        PeriodEnd::Duration(d) => duration::format(d),
    };

    format!("{}/{}", date_time::format(&value.start), end)
}

fn invalid(raw: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "PERIOD",
        raw: raw.to_string(),
        message: "expected start/end or start/duration".to_string(),
        line: 0,
    }
}
