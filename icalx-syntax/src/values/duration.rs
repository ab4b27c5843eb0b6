//! DURATION: `(-?)P(nW | nD)(T(nH)?(nM)?(nS)?)?`.

use crate::error::SyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationValue {
    pub negative: bool,
    pub days: i64,
    pub seconds: i64,
}

impl DurationValue {
    /// Total signed seconds, the representation most call sites want.
    pub fn total_seconds(&self) -> i64 {
        let magnitude = self.days * 86_400 + self.seconds;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn from_seconds(total_seconds: i64) -> Self {
        let negative = total_seconds < 0;
        let magnitude = total_seconds.unsigned_abs() as i64;
        DurationValue {
            negative,
            days: magnitude / 86_400,
            seconds: magnitude % 86_400,
        }
    }
}

pub fn parse(raw: &str) -> Result<DurationValue, SyntaxError> {
    let mut rest = raw;
    let negative = match rest.strip_prefix('-') {
        Some(r) => {
            rest = r;
            true
        }
        None => {
            rest = rest.strip_prefix('+').unwrap_or(rest);
            false
        }
    };

    let rest = rest.strip_prefix('P').ok_or_else(|| invalid(raw))?;

    // Whole-week form: "nW" and nothing else.
    if let Some(weeks_str) = rest.strip_suffix('W') {
        let weeks: i64 = weeks_str.parse().map_err(|_| invalid(raw))?;
        return Ok(DurationValue {
            negative,
            days: weeks * 7,
            seconds: 0,
        });
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let days = if date_part.is_empty() {
        0
    } else {
        let digits = date_part.strip_suffix('D').ok_or_else(|| invalid(raw))?;
        digits.parse::<i64>().map_err(|_| invalid(raw))?
    };

    let mut seconds: i64 = 0;

    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return Err(invalid(raw));
        }

        let mut remainder = time_part;

        if let Some((hours_str, rest)) = split_on_unit(remainder, 'H') {
            seconds += hours_str.parse::<i64>().map_err(|_| invalid(raw))? * 3600;
            remainder = rest;
        }

        if let Some((minutes_str, rest)) = split_on_unit(remainder, 'M') {
            seconds += minutes_str.parse::<i64>().map_err(|_| invalid(raw))? * 60;
            remainder = rest;
        }

        if let Some((seconds_str, rest)) = split_on_unit(remainder, 'S') {
            seconds += seconds_str.parse::<i64>().map_err(|_| invalid(raw))?;
            remainder = rest;
        }

        if !remainder.is_empty() {
            return Err(invalid(raw));
        }
    } else if days == 0 && date_part.is_empty() {
        return Err(invalid(raw));
    }

    Ok(DurationValue { negative, days, seconds })
}

fn split_on_unit(input: &str, unit: char) -> Option<(&str, &str)> {
    let idx = input.find(unit)?;
    Some((&input[..idx], &input[idx + 1..]))
}

pub fn format(value: &DurationValue) -> String {
    let sign = if value.negative { "-" } else { "" };

    if value.days % 7 == 0 && value.seconds == 0 && value.days != 0 {
        return format!("{sign}P{}W", value.days / 7);
    }

    let mut body = String::from("P");

    if value.days != 0 {
        body.push_str(&format!("{}D", value.days));
    }

    let hours = value.seconds / 3600;
    let minutes = (value.seconds % 3600) / 60;
    let secs = value.seconds % 60;

    if hours != 0 || minutes != 0 || secs != 0 {
        body.push('T');
        if hours != 0 {
            body.push_str(&format!("{hours}H"));
        }
        if minutes != 0 {
            body.push_str(&format!("{minutes}M"));
        }
        if secs != 0 {
            body.push_str(&format!("{secs}S"));
        }
    }

    if body == "P" {
        body.push_str("T0S");
    }

    format!("{sign}{body}")
}

fn invalid(raw: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "DURATION",
        raw: raw.to_string(),
        message: "expected ISO 8601-style iCalendar duration".to_string(),
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_week_form() {
        let v = parse("P3W").unwrap();
        assert_eq!(v.days, 21);
        assert_eq!(v.seconds, 0);
    }

    #[test]
    fn parses_mixed_form() {
        let v = parse("P1DT2H3M4S").unwrap();
        assert_eq!(v.days, 1);
        assert_eq!(v.seconds, 2 * 3600 + 3 * 60 + 4);
    }

    #[test]
    fn parses_negative() {
        let v = parse("-P1D").unwrap();
        assert!(v.negative);
        assert_eq!(v.total_seconds(), -86_400);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("garbage").is_err());
        assert!(parse("PT").is_err());
    }

    #[test]
    fn round_trips_seconds() {
        let v = DurationValue::from_seconds(-3725);
        assert_eq!(format(&v), "-PT1H2M5S");
    }
}
