//! TIME: `HHMMSS[Z]`.

use chrono::NaiveTime;

use crate::error::SyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValue {
    pub time: NaiveTime,
    pub is_utc: bool,
}

pub fn parse(raw: &str) -> Result<TimeValue, SyntaxError> {
    let (digits, is_utc) = match raw.strip_suffix('Z') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw));
    }

    let hour: u32 = digits[0..2].parse().map_err(|_| invalid(raw))?;
    let minute: u32 = digits[2..4].parse().map_err(|_| invalid(raw))?;
    let second: u32 = digits[4..6].parse().map_err(|_| invalid(raw))?;

    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| invalid(raw))?;

    Ok(TimeValue { time, is_utc })
}

pub fn format(value: &TimeValue) -> String {
    let base = value.time.format("%H%M%S").to_string();
    if value.is_utc {
        format!("{base}Z")
    } else {
        base
    }
}

fn invalid(raw: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "TIME",
        raw: raw.to_string(),
        message: "expected HHMMSS[Z]".to_string(),
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_time() {
        let v = parse("183000Z").unwrap();
        assert!(v.is_utc);
        assert_eq!(format(&v), "183000Z");
    }

    #[test]
    fn parses_local_time() {
        let v = parse("090000").unwrap();
        assert!(!v.is_utc);
    }
}
