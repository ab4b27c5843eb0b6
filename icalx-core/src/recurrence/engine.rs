//! Per-rule occurrence expansion (spec §4.7). One [`RuleIter`] walks a
//! single `RRULE` lazily, period by period: generate the period's raw
//! candidate dates, narrow them with the BY-filters, apply `BYSETPOS`,
//! and only then hand candidates to the caller. Multiple rules are
//! merged in `merge.rs`.
//!
//! Grounded in the teacher's `EventOccurrenceIterator` (an `Iterator`
//! impl wrapping a generator plus filter state); the per-FREQ candidate
//! generation below is hand-rolled rather than delegated to a
//! third-party RRULE crate, per the detailed per-FREQ algorithm this
//! module implements.

use std::collections::{HashSet, VecDeque};

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use super::rule::{safety_horizon, until_naive};
use icalx_syntax::values::recur::{Frequency, RecurRule};

/// Lazily walks the occurrences of a single `RRULE`, in ascending order,
/// honoring `COUNT`/`UNTIL`/the safety horizon.
pub struct RuleIter {
    rule: RecurRule,
    dtstart: NaiveDateTime,
    until: Option<NaiveDateTime>,
    horizon: NaiveDateTime,
    cursor: Cursor,
    buffer: VecDeque<NaiveDateTime>,
    emitted: u32,
    finished: bool,
    periods_advanced: u64,
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    SubDay(NaiveDateTime),
    Weekly(NaiveDate),
    Monthly(i32, u32),
    Yearly(i32),
}

/// A hard ceiling on how many periods we'll step through looking for a
/// match before giving up. Guards against BY-filter combinations that
/// can never be satisfied (e.g. `BYMONTH=2;BYMONTHDAY=31`).
const MAX_PERIODS_WITHOUT_MATCH: u64 = 20_000;

impl RuleIter {
    pub fn new(dtstart: NaiveDateTime, rule: RecurRule) -> Self {
        let until = until_naive(&rule);
        let horizon = safety_horizon(dtstart, rule.freq);
        let cursor = match rule.freq {
            Frequency::Secondly | Frequency::Minutely | Frequency::Hourly | Frequency::Daily => Cursor::SubDay(dtstart),
            Frequency::Weekly => Cursor::Weekly(week_start(dtstart.date(), rule.wkst)),
            Frequency::Monthly => Cursor::Monthly(dtstart.year(), dtstart.month()),
            Frequency::Yearly => Cursor::Yearly(dtstart.year()),
        };

        RuleIter {
            rule,
            dtstart,
            until,
            horizon,
            cursor,
            buffer: VecDeque::new(),
            emitted: 0,
            finished: false,
            periods_advanced: 0,
        }
    }

    fn fill_next_period(&mut self) {
        while self.buffer.is_empty() && !self.finished {
            let mut candidates = self.period_candidates();
            candidates.retain(|dt| *dt >= self.dtstart);
            if let Some(until) = self.until {
                candidates.retain(|dt| *dt <= until);
            }
            candidates.sort();
            candidates.dedup();

            self.advance_cursor();
            self.periods_advanced += 1;

            if self.past_horizon() || self.past_until() || self.periods_advanced > MAX_PERIODS_WITHOUT_MATCH {
                self.finished = true;
            }

            if !candidates.is_empty() {
                self.buffer.extend(candidates);
                return;
            }
        }
    }

    fn past_horizon(&self) -> bool {
        self.cursor_start_time() > self.horizon
    }

    fn past_until(&self) -> bool {
        self.until.map(|until| self.cursor_start_time() > until).unwrap_or(false)
    }

    fn cursor_start_time(&self) -> NaiveDateTime {
        match self.cursor {
            Cursor::SubDay(dt) => dt,
            Cursor::Weekly(d) => d.and_time(NaiveTime::MIN),
            Cursor::Monthly(y, m) => NaiveDate::from_ymd_opt(y, m, 1).map(|d| d.and_time(NaiveTime::MIN)).unwrap_or(NaiveDateTime::MAX),
            Cursor::Yearly(y) => NaiveDate::from_ymd_opt(y, 1, 1).map(|d| d.and_time(NaiveTime::MIN)).unwrap_or(NaiveDateTime::MAX),
        }
    }

    fn advance_cursor(&mut self) {
        let interval = self.rule.interval.max(1);
        self.cursor = match (self.cursor, self.rule.freq) {
            (Cursor::SubDay(dt), Frequency::Secondly) => Cursor::SubDay(dt + chrono::Duration::seconds(interval as i64)),
            (Cursor::SubDay(dt), Frequency::Minutely) => Cursor::SubDay(dt + chrono::Duration::minutes(interval as i64)),
            (Cursor::SubDay(dt), Frequency::Hourly) => Cursor::SubDay(dt + chrono::Duration::hours(interval as i64)),
            (Cursor::SubDay(dt), Frequency::Daily) => Cursor::SubDay(dt + chrono::Duration::days(interval as i64)),
            (Cursor::Weekly(d), Frequency::Weekly) => Cursor::Weekly(d + chrono::Duration::weeks(interval as i64)),
            (Cursor::Monthly(y, m), Frequency::Monthly) => {
                let base = NaiveDate::from_ymd_opt(y, m, 1).unwrap();
                let next = base.checked_add_months(Months::new(interval)).unwrap_or(base);
                Cursor::Monthly(next.year(), next.month())
            }
            (Cursor::Yearly(y), Frequency::Yearly) => Cursor::Yearly(y + interval as i32),
            (cursor, _) => cursor,
        };
    }

    /// Produces the (unfiltered-by-dtstart/until) candidate instants for
    /// the period the cursor currently points at.
    fn period_candidates(&self) -> Vec<NaiveDateTime> {
        match self.cursor {
            Cursor::SubDay(dt) => apply_subday_time_parts(self.rule.freq, dt, &self.rule),
            Cursor::Weekly(week_start_date) => {
                let mut days: Vec<NaiveDate> = (0..7).map(|i| week_start_date + chrono::Duration::days(i)).collect();
                apply_generic_day_filters(&mut days, &self.rule);
                if !self.rule.by_day.is_empty() {
                    let allowed: HashSet<Weekday> = self.rule.by_day.iter().map(|item| item.weekday).collect();
                    days.retain(|d| allowed.contains(&d.weekday()));
                } else {
                    days.retain(|d| d.weekday() == self.dtstart.weekday());
                }
                let days = apply_set_pos(days, &self.rule.by_set_pos);
                attach_time(days, self.dtstart.time(), &self.rule)
            }
            Cursor::Monthly(year, month) => {
                let days = monthly_candidates(&self.rule, self.dtstart, year, month);
                let days = apply_set_pos(days, &self.rule.by_set_pos);
                attach_time(days, self.dtstart.time(), &self.rule)
            }
            Cursor::Yearly(year) => {
                let days = yearly_candidates(&self.rule, self.dtstart, year);
                let days = apply_set_pos(days, &self.rule.by_set_pos);
                attach_time(days, self.dtstart.time(), &self.rule)
            }
        }
    }
}

impl Iterator for RuleIter {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        loop {
            if let Some(candidate) = self.buffer.pop_front() {
                if let Some(count) = self.rule.count {
                    if self.emitted >= count {
                        self.finished = true;
                        self.buffer.clear();
                        return None;
                    }
                }
                self.emitted += 1;
                return Some(candidate);
            }

            if self.finished {
                return None;
            }

            self.fill_next_period();
        }
    }
}

fn week_start(date: NaiveDate, wkst: Weekday) -> NaiveDate {
    let diff = (date.weekday().num_days_from_monday() as i64 - wkst.num_days_from_monday() as i64).rem_euclid(7);
    date - chrono::Duration::days(diff)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap();
    let this_month_first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    (next_month_first - this_month_first).num_days() as u32
}

fn resolve_month_day(year: i32, month: u32, day: i32, dim: u32) -> Option<NaiveDate> {
    let resolved = if day > 0 {
        day as u32
    } else if day < 0 {
        let d = dim as i32 + day + 1;
        if d < 1 {
            return None;
        }
        d as u32
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year, month, resolved)
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, ordinal: i32) -> Option<NaiveDate> {
    let dim = days_in_month(year, month);
    let matching: Vec<NaiveDate> = (1..=dim)
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .filter(|date| date.weekday() == weekday)
        .collect();

    if ordinal > 0 {
        matching.get((ordinal - 1) as usize).copied()
    } else if ordinal < 0 {
        let idx = matching.len() as i32 + ordinal;
        (idx >= 0).then(|| matching.get(idx as usize).copied()).flatten()
    } else {
        None
    }
}

fn nth_weekday_of_year(year: i32, weekday: Weekday, ordinal: i32) -> Option<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    let days = (end - start).num_days();
    let matching: Vec<NaiveDate> = (0..days)
        .map(|i| start + chrono::Duration::days(i))
        .filter(|date| date.weekday() == weekday)
        .collect();

    if ordinal > 0 {
        matching.get((ordinal - 1) as usize).copied()
    } else if ordinal < 0 {
        let idx = matching.len() as i32 + ordinal;
        (idx >= 0).then(|| matching.get(idx as usize).copied()).flatten()
    } else {
        None
    }
}

/// Candidate days for one MONTHLY period, with BYMONTHDAY and BYDAY
/// combined with AND semantics (RFC 5545 §3.3.10).
fn monthly_candidates(rule: &RecurRule, dtstart: NaiveDateTime, year: i32, month: u32) -> Vec<NaiveDate> {
    let dim = days_in_month(year, month);

    let mut days: Vec<NaiveDate> = if !rule.by_month_day.is_empty() {
        rule.by_month_day.iter().filter_map(|&d| resolve_month_day(year, month, d, dim)).collect()
    } else if !rule.by_day.is_empty() || !rule.by_set_pos.is_empty() {
        (1..=dim).filter_map(|d| NaiveDate::from_ymd_opt(year, month, d)).collect()
    } else {
        NaiveDate::from_ymd_opt(year, month, dtstart.day()).into_iter().collect()
    };

    if !rule.by_day.is_empty() {
        let allowed: HashSet<NaiveDate> = rule
            .by_day
            .iter()
            .flat_map(|item| match item.ordinal {
                Some(ord) => nth_weekday_of_month(year, month, item.weekday, ord).into_iter().collect::<Vec<_>>(),
                None => (1..=dim)
                    .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
                    .filter(|date| date.weekday() == item.weekday)
                    .collect(),
            })
            .collect();
        days.retain(|d| allowed.contains(d));
    }

    days.sort();
    days.dedup();
    days
}

/// Candidate days for one YEARLY period.
fn yearly_candidates(rule: &RecurRule, dtstart: NaiveDateTime, year: i32) -> Vec<NaiveDate> {
    let mut days = if !rule.by_week_no.is_empty() {
        let total_weeks = NaiveDate::from_ymd_opt(year, 12, 28).unwrap().iso_week().week();
        let mut days = Vec::new();
        for &wn in &rule.by_week_no {
            let week = if wn > 0 {
                wn as u32
            } else {
                (total_weeks as i32 + wn + 1).max(0) as u32
            };
            if week == 0 || week > total_weeks {
                continue;
            }
            for weekday in [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ] {
                if let Some(date) = NaiveDate::from_isoywd_opt(year, week, weekday) {
                    days.push(date);
                }
            }
        }
        if !rule.by_day.is_empty() {
            let allowed: HashSet<Weekday> = rule.by_day.iter().map(|item| item.weekday).collect();
            days.retain(|d| allowed.contains(&d.weekday()));
        }
        days
    } else if !rule.by_year_day.is_empty() {
        let is_leap = NaiveDate::from_ymd_opt(year, 12, 31).unwrap().ordinal() == 366;
        let total_days = if is_leap { 366 } else { 365 };
        let mut days = Vec::new();
        for &yd in &rule.by_year_day {
            let ordinal = if yd > 0 { yd } else { total_days + yd + 1 };
            if ordinal < 1 || ordinal > total_days {
                continue;
            }
            if let Some(date) = NaiveDate::from_yo_opt(year, ordinal as u32) {
                days.push(date);
            }
        }
        if !rule.by_day.is_empty() {
            let allowed: HashSet<Weekday> = rule.by_day.iter().map(|item| item.weekday).collect();
            days.retain(|d| allowed.contains(&d.weekday()));
        }
        days
    } else if rule.by_month.is_empty() && rule.by_day.iter().any(|item| item.ordinal.is_some()) {
        // Plain YEARLY with an ordinal BYDAY and no BYMONTH: the ordinal
        // counts occurrences across the whole year, not per month.
        rule.by_day
            .iter()
            .flat_map(|item| match item.ordinal {
                Some(ord) => nth_weekday_of_year(year, item.weekday, ord).into_iter().collect::<Vec<_>>(),
                None => {
                    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
                    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap();
                    (0..(end - start).num_days())
                        .map(|i| start + chrono::Duration::days(i))
                        .filter(|date| date.weekday() == item.weekday)
                        .collect()
                }
            })
            .collect()
    } else {
        let months: Vec<u32> = if !rule.by_month.is_empty() {
            rule.by_month.clone()
        } else {
            vec![dtstart.month()]
        };
        months.into_iter().flat_map(|month| monthly_candidates(rule, dtstart, year, month)).collect()
    };

    apply_generic_day_filters(&mut days, rule);
    days.sort();
    days.dedup();
    days
}

/// BYMONTH/BYMONTHDAY applied as plain membership filters, for the
/// candidate paths that didn't already consume them as generators.
fn apply_generic_day_filters(days: &mut Vec<NaiveDate>, rule: &RecurRule) {
    if !rule.by_month.is_empty() {
        days.retain(|d| rule.by_month.contains(&d.month()));
    }
    if !rule.by_month_day.is_empty() {
        days.retain(|d| {
            let dim = days_in_month(d.year(), d.month());
            rule.by_month_day.iter().any(|&md| resolve_month_day(d.year(), d.month(), md, dim) == Some(*d))
        });
    }
}

fn apply_set_pos(mut days: Vec<NaiveDate>, by_set_pos: &[i32]) -> Vec<NaiveDate> {
    if by_set_pos.is_empty() {
        return days;
    }
    days.sort();
    days.dedup();
    let len = days.len() as i32;
    let mut picked: Vec<NaiveDate> = by_set_pos
        .iter()
        .filter_map(|&pos| {
            let idx = if pos > 0 { pos - 1 } else { len + pos };
            (idx >= 0 && idx < len).then(|| days[idx as usize])
        })
        .collect();
    picked.sort();
    picked.dedup();
    picked
}

/// Expands a list of dates into datetimes at `base_time`, expanding the
/// time-of-day across BYHOUR/BYMINUTE/BYSECOND when present (they carry
/// coarser granularity than the surrounding day-level FREQ).
fn attach_time(dates: Vec<NaiveDate>, base_time: NaiveTime, rule: &RecurRule) -> Vec<NaiveDateTime> {
    let mut times = vec![base_time];
    if !rule.by_hour.is_empty() {
        times = expand_hours(&times, &rule.by_hour);
    }
    if !rule.by_minute.is_empty() {
        times = expand_minutes(&times, &rule.by_minute);
    }
    if !rule.by_second.is_empty() {
        times = expand_seconds(&times, &rule.by_second);
    }

    dates.into_iter().flat_map(|date| times.iter().map(move |t| NaiveDateTime::new(date, *t))).collect()
}

fn expand_hours(times: &[NaiveTime], hours: &[u32]) -> Vec<NaiveTime> {
    times
        .iter()
        .flat_map(|t| hours.iter().filter_map(move |&h| NaiveTime::from_hms_opt(h, t.minute_part(), t.second_part())))
        .collect()
}

fn expand_minutes(times: &[NaiveTime], minutes: &[u32]) -> Vec<NaiveTime> {
    times
        .iter()
        .flat_map(|t| minutes.iter().filter_map(move |&m| NaiveTime::from_hms_opt(t.hour_part(), m, t.second_part())))
        .collect()
}

fn expand_seconds(times: &[NaiveTime], seconds: &[u32]) -> Vec<NaiveTime> {
    times
        .iter()
        .flat_map(|t| seconds.iter().filter_map(move |&s| NaiveTime::from_hms_opt(t.hour_part(), t.minute_part(), s)))
        .collect()
}

trait NaiveTimeParts {
    fn hour_part(&self) -> u32;
    fn minute_part(&self) -> u32;
    fn second_part(&self) -> u32;
}

impl NaiveTimeParts for NaiveTime {
    fn hour_part(&self) -> u32 {
        use chrono::Timelike;
        self.hour()
    }
    fn minute_part(&self) -> u32 {
        use chrono::Timelike;
        self.minute()
    }
    fn second_part(&self) -> u32 {
        use chrono::Timelike;
        self.second()
    }
}

/// BYHOUR/BYMINUTE/BYSECOND for sub-day FREQs: they filter when they're
/// at the same or finer granularity than FREQ, expand when coarser.
fn apply_subday_time_parts(freq: Frequency, instant: NaiveDateTime, rule: &RecurRule) -> Vec<NaiveDateTime> {
    use chrono::Timelike;

    match freq {
        Frequency::Daily => attach_time(vec![instant.date()], instant.time(), rule),
        Frequency::Hourly => {
            if !rule.by_hour.is_empty() && !rule.by_hour.contains(&instant.hour()) {
                return vec![];
            }
            let mut times = vec![instant.time()];
            if !rule.by_minute.is_empty() {
                times = expand_minutes(&times, &rule.by_minute);
            }
            if !rule.by_second.is_empty() {
                times = expand_seconds(&times, &rule.by_second);
            }
            times.into_iter().map(|t| NaiveDateTime::new(instant.date(), t)).collect()
        }
        Frequency::Minutely => {
            if !rule.by_hour.is_empty() && !rule.by_hour.contains(&instant.hour()) {
                return vec![];
            }
            if !rule.by_minute.is_empty() && !rule.by_minute.contains(&instant.minute()) {
                return vec![];
            }
            let mut times = vec![instant.time()];
            if !rule.by_second.is_empty() {
                times = expand_seconds(&times, &rule.by_second);
            }
            times.into_iter().map(|t| NaiveDateTime::new(instant.date(), t)).collect()
        }
        Frequency::Secondly => {
            if !rule.by_hour.is_empty() && !rule.by_hour.contains(&instant.hour()) {
                return vec![];
            }
            if !rule.by_minute.is_empty() && !rule.by_minute.contains(&instant.minute()) {
                return vec![];
            }
            if !rule.by_second.is_empty() && !rule.by_second.contains(&instant.second()) {
                return vec![];
            }
            vec![instant]
        }
        _ => vec![instant],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalx_syntax::values::recur;

    fn dtstart(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn daily_with_count_produces_contiguous_days() {
        let rule = recur::parse("FREQ=DAILY;COUNT=3").unwrap();
        let start = dtstart("2024-01-01T09:00:00");
        let occurrences: Vec<_> = RuleIter::new(start, rule).collect();
        assert_eq!(
            occurrences,
            vec![dtstart("2024-01-01T09:00:00"), dtstart("2024-01-02T09:00:00"), dtstart("2024-01-03T09:00:00")]
        );
    }

    #[test]
    fn monthly_last_weekday_via_set_pos() {
        let rule = recur::parse("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=2").unwrap();
        let start = dtstart("2024-01-01T09:00:00");
        let occurrences: Vec<_> = RuleIter::new(start, rule).collect();
        // Last weekday of Jan 2024 is Wed Jan 31; of Feb 2024 is Thu Feb 29.
        assert_eq!(occurrences, vec![dtstart("2024-01-31T09:00:00"), dtstart("2024-02-29T09:00:00")]);
    }

    #[test]
    fn friday_the_thirteenth() {
        let rule = recur::parse("FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=2").unwrap();
        let start = dtstart("2024-01-01T09:00:00");
        let occurrences: Vec<_> = RuleIter::new(start, rule).collect();
        assert_eq!(occurrences, vec![dtstart("2024-09-13T09:00:00"), dtstart("2024-12-13T09:00:00")]);
    }

    #[test]
    fn weekly_respects_until() {
        let rule = recur::parse("FREQ=WEEKLY;UNTIL=20240122T090000Z").unwrap();
        let start = dtstart("2024-01-01T09:00:00");
        let occurrences: Vec<_> = RuleIter::new(start, rule).collect();
        assert_eq!(occurrences.len(), 4);
    }

    #[test]
    fn occurrences_are_strictly_increasing() {
        let rule = recur::parse("FREQ=MONTHLY;BYMONTHDAY=1,15;COUNT=6").unwrap();
        let start = dtstart("2024-01-01T09:00:00");
        let occurrences: Vec<_> = RuleIter::new(start, rule).collect();
        for pair in occurrences.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
