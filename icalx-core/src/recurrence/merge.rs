//! Multi-`RRULE` merge plus `RDATE`/`EXDATE` fusion (spec §4.7's
//! "Recurrence input view" and "Occurrence"). A component can carry more
//! than one `RRULE`; their candidate streams are merged in chronological
//! order with duplicates collapsed, `EXDATE` entries drop matching
//! instants (exact or date-only, per how the EXDATE was declared), and
//! `RDATE` entries are fused in, each tagged `is_from_rdate`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{NaiveDate, NaiveDateTime};

use super::engine::RuleIter;
use icalx_syntax::values::recur::RecurRule;

/// One produced occurrence: start, an optional end, and whether it came
/// from an `RDATE` rather than `RRULE` expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub is_from_rdate: bool,
}

/// An `EXDATE` entry matches either one exact instant or an entire day
/// (when declared `VALUE=DATE`), per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionMatch {
    Exact(NaiveDateTime),
    DateOnly(NaiveDate),
}

impl ExceptionMatch {
    fn matches(&self, instant: NaiveDateTime) -> bool {
        match self {
            Self::Exact(dt) => *dt == instant,
            Self::DateOnly(date) => *date == instant.date(),
        }
    }
}

/// Everything the engine needs from a component to expand its
/// recurrence (§3's "Recurrence input view"): DTSTART, the RRULEs to
/// merge, the EXDATE exceptions, the RDATE additions, and an optional
/// hard ceiling for unbounded rules.
#[derive(Debug, Clone)]
pub struct RecurrenceInput {
    pub dtstart: NaiveDateTime,
    pub rules: Vec<RecurRule>,
    pub exdates: Vec<ExceptionMatch>,
    pub rdates: Vec<NaiveDateTime>,
    pub range_end: Option<NaiveDateTime>,
}

struct HeapItem {
    instant: NaiveDateTime,
    source: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest instant out first.
        other.instant.cmp(&self.instant)
    }
}

/// Chronologically merges every `RRULE`'s occurrence stream via a k-way
/// merge, de-duplicates candidates shared by more than one rule, folds
/// in `RDATE` (tagged `is_from_rdate`), and drops anything matched by an
/// `EXDATE`. Produces a lazy, strictly-increasing `Occurrence` stream.
pub struct OccurrenceIter {
    sources: Vec<RuleIter>,
    heap: BinaryHeap<HeapItem>,
    rdates: std::collections::VecDeque<NaiveDateTime>,
    exdates: Vec<ExceptionMatch>,
    range_end: Option<NaiveDateTime>,
    last_emitted: Option<NaiveDateTime>,
    initialized: bool,
}

impl OccurrenceIter {
    pub fn new(input: RecurrenceInput) -> Self {
        let sources: Vec<RuleIter> = input.rules.into_iter().map(|rule| RuleIter::new(input.dtstart, rule)).collect();

        // Seed DTSTART itself as an occurrence when no RRULE exists at all
        // (a bare DTSTART is its own single occurrence, per §3) -- modeled
        // as a one-shot RRULE-less source by injecting it into rdates.
        let mut rdates: Vec<NaiveDateTime> = input.rdates;
        if sources.is_empty() && rdates.is_empty() {
            rdates.push(input.dtstart);
        }
        rdates.sort();
        rdates.dedup();

        OccurrenceIter {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            rdates: rdates.into(),
            exdates: input.exdates,
            range_end: input.range_end,
            last_emitted: None,
            initialized: false,
        }
    }

    fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        for (index, source) in self.sources.iter_mut().enumerate() {
            if let Some(instant) = source.next() {
                self.heap.push(HeapItem { instant, source: index });
            }
        }
        self.initialized = true;
    }

    fn is_excluded(&self, instant: NaiveDateTime) -> bool {
        self.exdates.iter().any(|ex| ex.matches(instant))
    }

    fn next_candidate(&mut self) -> Option<(NaiveDateTime, bool)> {
        self.ensure_initialized();

        loop {
            let next_rule = self.heap.peek().map(|item| item.instant);
            let next_rdate = self.rdates.front().copied();

            let (instant, is_from_rdate) = match (next_rule, next_rdate) {
                (Some(r), Some(d)) if d < r => (self.rdates.pop_front().unwrap(), true),
                (Some(r), Some(d)) if d == r => {
                    self.rdates.pop_front();
                    let item = self.heap.pop().unwrap();
                    if let Some(value) = self.sources[item.source].next() {
                        self.heap.push(HeapItem { instant: value, source: item.source });
                    }
                    (r, false)
                }
                (Some(_), Some(_)) => {
                    let item = self.heap.pop().unwrap();
                    if let Some(value) = self.sources[item.source].next() {
                        self.heap.push(HeapItem { instant: value, source: item.source });
                    }
                    (item.instant, false)
                }
                (Some(_), None) => {
                    let item = self.heap.pop().unwrap();
                    if let Some(value) = self.sources[item.source].next() {
                        self.heap.push(HeapItem { instant: value, source: item.source });
                    }
                    (item.instant, false)
                }
                (None, Some(_)) => (self.rdates.pop_front().unwrap(), true),
                (None, None) => return None,
            };

            if let Some(last) = self.last_emitted {
                if instant <= last {
                    continue;
                }
            }
            if let Some(range_end) = self.range_end {
                if instant > range_end {
                    return None;
                }
            }

            self.last_emitted = Some(instant);

            if self.is_excluded(instant) {
                continue;
            }

            return Some((instant, is_from_rdate));
        }
    }
}

impl Iterator for OccurrenceIter {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        self.next_candidate().map(|(start, is_from_rdate)| Occurrence {
            start,
            end: None,
            is_from_rdate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalx_syntax::values::recur;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn daily_with_exdate_skips_the_excluded_day() {
        let dtstart = dt("2024-01-01T09:00:00");
        let input = RecurrenceInput {
            dtstart,
            rules: vec![recur::parse("FREQ=DAILY;COUNT=4").unwrap()],
            exdates: vec![ExceptionMatch::Exact(dt("2024-01-02T09:00:00"))],
            rdates: vec![],
            range_end: None,
        };
        let starts: Vec<_> = OccurrenceIter::new(input).map(|o| o.start).collect();
        assert_eq!(starts, vec![dt("2024-01-01T09:00:00"), dt("2024-01-03T09:00:00"), dt("2024-01-04T09:00:00")]);
    }

    #[test]
    fn rdate_fuses_in_and_is_tagged() {
        let dtstart = dt("2024-01-01T09:00:00");
        let input = RecurrenceInput {
            dtstart,
            rules: vec![recur::parse("FREQ=DAILY;COUNT=2").unwrap()],
            exdates: vec![],
            rdates: vec![dt("2024-01-10T09:00:00")],
            range_end: None,
        };
        let occurrences: Vec<_> = OccurrenceIter::new(input).collect();
        assert_eq!(occurrences.len(), 3);
        assert!(occurrences.last().unwrap().is_from_rdate);
    }

    #[test]
    fn duplicate_rdate_matching_rrule_occurrence_is_not_double_counted() {
        let dtstart = dt("2024-01-01T09:00:00");
        let input = RecurrenceInput {
            dtstart,
            rules: vec![recur::parse("FREQ=DAILY;COUNT=3").unwrap()],
            exdates: vec![],
            rdates: vec![dt("2024-01-02T09:00:00")],
            range_end: None,
        };
        let occurrences: Vec<_> = OccurrenceIter::new(input).collect();
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn multiple_rrules_merge_in_chronological_order() {
        let dtstart = dt("2024-01-01T09:00:00");
        let input = RecurrenceInput {
            dtstart,
            rules: vec![
                recur::parse("FREQ=WEEKLY;COUNT=2").unwrap(),
                recur::parse("FREQ=MONTHLY;COUNT=2").unwrap(),
            ],
            exdates: vec![],
            rdates: vec![],
            range_end: None,
        };
        let starts: Vec<_> = OccurrenceIter::new(input).map(|o| o.start).collect();
        for pair in starts.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn date_only_exdate_excludes_regardless_of_time() {
        let dtstart = dt("2024-01-01T09:00:00");
        let input = RecurrenceInput {
            dtstart,
            rules: vec![recur::parse("FREQ=DAILY;COUNT=3").unwrap()],
            exdates: vec![ExceptionMatch::DateOnly(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())],
            rdates: vec![],
            range_end: None,
        };
        let starts: Vec<_> = OccurrenceIter::new(input).map(|o| o.start).collect();
        assert_eq!(starts, vec![dt("2024-01-01T09:00:00"), dt("2024-01-03T09:00:00")]);
    }
}
