//! UTC-OFFSET: `(+-)HHMM[SS]`.

use crate::error::SyntaxError;

pub fn parse(raw: &str, strict: bool) -> Result<i32, SyntaxError> {
    let (sign, digits) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid(raw)),
    };

    if digits.len() != 4 && digits.len() != 6 {
        return Err(invalid(raw));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw));
    }

    let hours: i32 = digits[0..2].parse().map_err(|_| invalid(raw))?;
    let minutes: i32 = digits[2..4].parse().map_err(|_| invalid(raw))?;
    let seconds: i32 = if digits.len() == 6 {
        digits[4..6].parse().map_err(|_| invalid(raw))?
    } else {
        0
    };

    if strict && (hours > 23 || minutes > 59 || seconds > 59) {
        return Err(invalid(raw));
    }

    Ok(sign * (hours * 3600 + minutes * 60 + seconds))
}

pub fn format(total_seconds: i32) -> String {
    let sign = if total_seconds < 0 { "-" } else { "+" };
    let magnitude = total_seconds.unsigned_abs();
    let hours = magnitude / 3600;
    let minutes = (magnitude % 3600) / 60;
    let seconds = magnitude % 60;

    if seconds != 0 {
        format!("{sign}{hours:02}{minutes:02}{seconds:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}")
    }
}

fn invalid(raw: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "UTC-OFFSET",
        raw: raw.to_string(),
        message: "expected (+-)HHMM[SS]".to_string(),
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_offset() {
        assert_eq!(parse("+0100", true).unwrap(), 3600);
    }

    #[test]
    fn parses_negative_offset_with_seconds() {
        assert_eq!(parse("-013015", true).unwrap(), -(1 * 3600 + 30 * 60 + 15));
    }

    #[test]
    fn strict_rejects_out_of_range() {
        assert!(parse("+2400", true).is_err());
        assert!(parse("+0060", true).is_err());
    }

    #[test]
    fn round_trips_format() {
        assert_eq!(format(3600), "+0100");
        assert_eq!(format(-5400), "-0130");
    }
}
