//! RECUR: the RRULE grammar (RFC 5545 §3.3.10). This module only parses
//! and formats the *rule record*; expanding it into an occurrence stream
//! is `icalx-core::recurrence`'s job (spec §4.7) -- the split mirrors the
//! spec's own component table, where the value codec (20% share) and the
//! recurrence engine (28% share) are named as separate components.

use chrono::Weekday;

use crate::error::SyntaxError;
use crate::values::date_time::{self, DateTimeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

/// One `BYDAY` entry: an optional ordinal (`-1SU`, `2WE`) plus weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByDayItem {
    pub ordinal: Option<i32>,
    pub weekday: Weekday,
}

fn parse_weekday(raw: &str) -> Option<Weekday> {
    Some(match raw {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    })
}

fn weekday_str(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn parse_byday_item(raw: &str) -> Option<ByDayItem> {
    let (ordinal_str, weekday_str) = raw.split_at(raw.len().checked_sub(2)?);
    let weekday = parse_weekday(weekday_str)?;

    let ordinal = if ordinal_str.is_empty() {
        None
    } else {
        Some(ordinal_str.parse::<i32>().ok()?)
    };

    Some(ByDayItem { ordinal, weekday })
}

fn format_byday_item(item: &ByDayItem) -> String {
    match item.ordinal {
        Some(ordinal) => format!("{ordinal}{}", weekday_str(item.weekday)),
        None => weekday_str(item.weekday).to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurRule {
    pub freq: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<DateTimeValue>,
    pub wkst: Weekday,
    pub by_second: Vec<u32>,
    pub by_minute: Vec<u32>,
    pub by_hour: Vec<u32>,
    pub by_day: Vec<ByDayItem>,
    pub by_month_day: Vec<i32>,
    pub by_year_day: Vec<i32>,
    pub by_week_no: Vec<i32>,
    pub by_month: Vec<u32>,
    pub by_set_pos: Vec<i32>,
}

impl RecurRule {
    pub fn has_freq(&self) -> bool {
        true // FREQ is required to construct a RecurRule at all (see parse)
    }

    pub fn has_bounded_end(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }
}

fn parse_int_list(raw: &str) -> Result<Vec<i32>, ()> {
    raw.split(',').map(|item| item.parse::<i32>().map_err(|_| ())).collect()
}

fn parse_uint_list(raw: &str) -> Result<Vec<u32>, ()> {
    raw.split(',').map(|item| item.parse::<u32>().map_err(|_| ())).collect()
}

pub fn parse(raw: &str) -> Result<RecurRule, SyntaxError> {
    let mut freq: Option<Frequency> = None;
    let mut interval: u32 = 1;
    let mut count: Option<u32> = None;
    let mut until: Option<DateTimeValue> = None;
    let mut wkst = Weekday::Mon;
    let mut by_second = Vec::new();
    let mut by_minute = Vec::new();
    let mut by_hour = Vec::new();
    let mut by_day = Vec::new();
    let mut by_month_day = Vec::new();
    let mut by_year_day = Vec::new();
    let mut by_week_no = Vec::new();
    let mut by_month = Vec::new();
    let mut by_set_pos = Vec::new();

    for part in raw.split(';') {
        if part.is_empty() {
            continue;
        }

        let (key, value) = part.split_once('=').ok_or_else(|| invalid(raw, "missing '=' in RRULE part"))?;

        match key.to_ascii_uppercase().as_str() {
            "FREQ" => freq = Some(Frequency::parse(value).ok_or_else(|| invalid(raw, "unknown FREQ"))?),
            "INTERVAL" => interval = value.parse().map_err(|_| invalid(raw, "bad INTERVAL"))?,
            "COUNT" => count = Some(value.parse().map_err(|_| invalid(raw, "bad COUNT"))?),
            "UNTIL" => until = Some(date_time::parse(value, None, false).map_err(|_| invalid(raw, "bad UNTIL"))?),
            "WKST" => wkst = parse_weekday(value).ok_or_else(|| invalid(raw, "bad WKST"))?,
            "BYSECOND" => by_second = parse_uint_list(value).map_err(|_| invalid(raw, "bad BYSECOND"))?,
            "BYMINUTE" => by_minute = parse_uint_list(value).map_err(|_| invalid(raw, "bad BYMINUTE"))?,
            "BYHOUR" => by_hour = parse_uint_list(value).map_err(|_| invalid(raw, "bad BYHOUR"))?,
            "BYDAY" => {
                by_day = value
                    .split(',')
                    .map(|item| parse_byday_item(item).ok_or_else(|| invalid(raw, "bad BYDAY")))
                    .collect::<Result<_, _>>()?
            }
            "BYMONTHDAY" => by_month_day = parse_int_list(value).map_err(|_| invalid(raw, "bad BYMONTHDAY"))?,
            "BYYEARDAY" => by_year_day = parse_int_list(value).map_err(|_| invalid(raw, "bad BYYEARDAY"))?,
            "BYWEEKNO" => by_week_no = parse_int_list(value).map_err(|_| invalid(raw, "bad BYWEEKNO"))?,
            "BYMONTH" => by_month = parse_uint_list(value).map_err(|_| invalid(raw, "bad BYMONTH"))?,
            "BYSETPOS" => by_set_pos = parse_int_list(value).map_err(|_| invalid(raw, "bad BYSETPOS"))?,
            // Unknown/experimental rule parts (e.g. BYEASTER) are tolerated
            // and dropped: unlike properties, RECUR has no Generic carry-through.
            _ => {}
        }
    }

    let freq = freq.ok_or_else(|| invalid(raw, "FREQ is required"))?;

    Ok(RecurRule {
        freq,
        interval,
        count,
        until,
        wkst,
        by_second,
        by_minute,
        by_hour,
        by_day,
        by_month_day,
        by_year_day,
        by_week_no,
        by_month,
        by_set_pos,
    })
}

pub fn format(rule: &RecurRule) -> String {
    let mut parts = vec![format!("FREQ={}", rule.freq.as_str())];

    if rule.interval != 1 {
        parts.push(format!("INTERVAL={}", rule.interval));
    }
    if let Some(count) = rule.count {
        parts.push(format!("COUNT={count}"));
    }
    if let Some(until) = &rule.until {
        parts.push(format!("UNTIL={}", date_time::format(until)));
    }
    if rule.wkst != Weekday::Mon {
        parts.push(format!("WKST={}", weekday_str(rule.wkst)));
    }
    if !rule.by_second.is_empty() {
        parts.push(format!("BYSECOND={}", join(&rule.by_second)));
    }
    if !rule.by_minute.is_empty() {
        parts.push(format!("BYMINUTE={}", join(&rule.by_minute)));
    }
    if !rule.by_hour.is_empty() {
        parts.push(format!("BYHOUR={}", join(&rule.by_hour)));
    }
    if !rule.by_day.is_empty() {
        let joined = rule.by_day.iter().map(format_byday_item).collect::<Vec<_>>().join(",");
        parts.push(format!("BYDAY={joined}"));
    }
    if !rule.by_month_day.is_empty() {
        parts.push(format!("BYMONTHDAY={}", join(&rule.by_month_day)));
    }
    if !rule.by_year_day.is_empty() {
        parts.push(format!("BYYEARDAY={}", join(&rule.by_year_day)));
    }
    if !rule.by_week_no.is_empty() {
        parts.push(format!("BYWEEKNO={}", join(&rule.by_week_no)));
    }
    if !rule.by_month.is_empty() {
        parts.push(format!("BYMONTH={}", join(&rule.by_month)));
    }
    if !rule.by_set_pos.is_empty() {
        parts.push(format!("BYSETPOS={}", join(&rule.by_set_pos)));
    }

    parts.join(";")
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn invalid(raw: &str, message: &str) -> SyntaxError {
    SyntaxError::ValueFormat {
        kind: "RECUR",
        raw: raw.to_string(),
        message: message.to_string(),
        line: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_freq_and_defaults() {
        let rule = parse("FREQ=DAILY;COUNT=3").unwrap();
        assert_eq!(rule.freq, Frequency::Daily);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.count, Some(3));
        assert_eq!(rule.wkst, Weekday::Mon);
    }

    #[test]
    fn parses_byday_with_ordinals() {
        let rule = parse("FREQ=MONTHLY;BYDAY=-1SU,2WE").unwrap();
        assert_eq!(
            rule.by_day,
            vec![
                ByDayItem { ordinal: Some(-1), weekday: Weekday::Sun },
                ByDayItem { ordinal: Some(2), weekday: Weekday::Wed },
            ]
        );
    }

    #[test]
    fn rejects_missing_freq() {
        assert!(parse("INTERVAL=2").is_err());
    }

    #[test]
    fn tolerates_unknown_parts() {
        assert!(parse("FREQ=YEARLY;BYEASTER=-1").is_ok());
    }

    #[test]
    fn round_trips_canonical_order() {
        let rule = parse("FREQ=MONTHLY;INTERVAL=2;COUNT=10;BYMONTHDAY=7,10").unwrap();
        assert_eq!(format(&rule), "FREQ=MONTHLY;INTERVAL=2;COUNT=10;BYMONTHDAY=7,10");
    }
}
