//! DATE: `YYYYMMDD`, validated against the proleptic Gregorian calendar.

use chrono::NaiveDate;

use crate::error::SyntaxError;

pub type Date = NaiveDate;

pub fn parse(raw: &str) -> Result<Date, SyntaxError> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw, "expected YYYYMMDD"));
    }

    let year: i32 = raw[0..4].parse().map_err(|_| invalid(raw, "bad year"))?;
    let month: u32 = raw[4..6].parse().map_err(|_| invalid(raw, "bad month"))?;
    let day: u32 = raw[6..8].parse().map_err(|_| invalid(raw, "bad day"))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(raw, "not a valid Gregorian date"))
}

pub fn format(date: &Date) -> String {
    date.format("%Y%m%d").to_string()
}

fn invalid(raw: &str, message: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "DATE",
        raw: raw.to_string(),
        message: message.to_string(),
        line: 0,
    }
}
