//! DATE-TIME: `YYYYMMDDTHHMMSS` (floating local), `...Z` (UTC), or local +
//! `TZID=` parameter (zoned). Strict mode accepts only these three forms;
//! lenient mode falls back to a best-effort general parse.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SyntaxError;

/// A DATE-TIME's timezone qualification, carried alongside the decoded
/// instant per §3. Resolution of `Zoned`'s TZID against an actual
/// `VTIMEZONE`/IANA database is `icalx-core`'s job (it alone knows the
/// calendar's defined timezones); this crate only records the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum DateTimeValue {
    Floating(NaiveDateTime),
    Utc(NaiveDateTime),
    Zoned(NaiveDateTime, String),
}

impl DateTimeValue {
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Floating(dt) | Self::Utc(dt) | Self::Zoned(dt, _) => *dt,
        }
    }

    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Zoned(_, tzid) => Some(tzid.as_str()),
            _ => None,
        }
    }

    pub fn is_utc(&self) -> bool {
        matches!(self, Self::Utc(_))
    }
}

fn parse_basic(digits: &str) -> Option<NaiveDateTime> {
    if digits.len() != 15 || digits.as_bytes()[8] != b'T' {
        return None;
    }

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let hour: u32 = digits[9..11].parse().ok()?;
    let minute: u32 = digits[11..13].parse().ok()?;
    let second: u32 = digits[13..15].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;

    Some(NaiveDateTime::new(date, time))
}

pub fn parse_strict(raw: &str, tzid: Option<&str>) -> Result<DateTimeValue, SyntaxError> {
    if let Some(digits) = raw.strip_suffix('Z') {
        return parse_basic(digits).map(DateTimeValue::Utc).ok_or_else(|| invalid(raw));
    }

    let naive = parse_basic(raw).ok_or_else(|| invalid(raw))?;

    Ok(match tzid {
        Some(tzid) => DateTimeValue::Zoned(naive, tzid.to_string()),
        None => DateTimeValue::Floating(naive),
    })
}

/// Best-effort fallback used only in lenient mode: accepts a handful of
/// common real-world deviations (date-only, `YYYY-MM-DD[T]HH:MM:SS`, a
/// missing seconds field) rather than failing the whole parse.
pub fn parse_lenient(raw: &str, tzid: Option<&str>) -> Result<DateTimeValue, SyntaxError> {
    let cleaned: String = raw.chars().filter(|c| *c != '-' && *c != ':').collect();
    let (digits, trailing_z) = match cleaned.strip_suffix('Z') {
        Some(rest) => (rest.to_string(), true),
        None => (cleaned, false),
    };

    let with_time = if digits.contains('T') {
        digits
    } else if digits.len() == 8 {
        format!("{digits}T000000")
    } else {
        digits
    };

    let padded = if with_time.len() == 13 {
        format!("{with_time}00")
    } else {
        with_time
    };

    let naive = parse_basic(&padded).ok_or_else(|| invalid(raw))?;

    Ok(if trailing_z {
        DateTimeValue::Utc(naive)
    } else if let Some(tzid) = tzid {
        DateTimeValue::Zoned(naive, tzid.to_string())
    } else {
        DateTimeValue::Floating(naive)
    })
}

pub fn parse(raw: &str, tzid: Option<&str>, strict: bool) -> Result<DateTimeValue, SyntaxError> {
    match parse_strict(raw, tzid) {
        Ok(value) => Ok(value),
        Err(err) if !strict => parse_lenient(raw, tzid).or(Err(err)),
        Err(err) => Err(err),
    }
}

/// Used by the property-assembly layer to recover the warning spec §7
/// requires when a lenient parse only succeeded via the fallback path.
pub fn parse_with_warning(
    raw: &str,
    tzid: Option<&str>,
    strict: bool,
) -> Result<(DateTimeValue, Option<SyntaxError>), SyntaxError> {
    match parse_strict(raw, tzid) {
        Ok(value) => Ok((value, None)),
        Err(strict_err) if !strict => {
            let value = parse_lenient(raw, tzid)?;
            Ok((value, Some(strict_err)))
        }
        Err(err) => Err(err),
    }
}

pub fn format(value: &DateTimeValue) -> String {
    match value {
        DateTimeValue::Floating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
        DateTimeValue::Utc(dt) => format!("{}Z", dt.format("%Y%m%dT%H%M%S")),
        DateTimeValue::Zoned(dt, _tzid) => dt.format("%Y%m%dT%H%M%S").to_string(),
    }
}

fn invalid(raw: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "DATE-TIME",
        raw: raw.to_string(),
        message: "expected YYYYMMDDTHHMMSS[Z] or local + TZID".to_string(),
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_form() {
        let v = parse_strict("19970902T090000Z", None).unwrap();
        assert!(matches!(v, DateTimeValue::Utc(_)));
        assert_eq!(format(&v), "19970902T090000Z");
    }

    #[test]
    fn parses_zoned_form() {
        let v = parse_strict("20240101T090000", Some("Europe/London")).unwrap();
        assert_eq!(v.tzid(), Some("Europe/London"));
    }

    #[test]
    fn parses_floating_form() {
        let v = parse_strict("20240101T090000", None).unwrap();
        assert!(matches!(v, DateTimeValue::Floating(_)));
    }

    #[test]
    fn strict_rejects_other_forms() {
        assert!(parse_strict("2024-01-01T09:00:00", None).is_err());
    }

    #[test]
    fn lenient_recovers_dashed_form_with_warning() {
        let (value, warning) = parse_with_warning("2024-01-01T09:00:00Z", None, false).unwrap();
        assert!(matches!(value, DateTimeValue::Utc(_)));
        assert!(warning.is_some());
    }

    #[test]
    fn strict_mode_never_falls_back() {
        assert!(parse_with_warning("2024-01-01T09:00:00Z", None, true).is_err());
    }
}
