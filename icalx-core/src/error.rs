//! Component-tree-level failures, layered on top of `icalx_syntax::SyntaxError`.

use icalx_syntax::SyntaxError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("[ICAL-STRUCT-001] BEGIN:{name} at line {line} has no matching END")]
    UnmatchedBegin { name: String, line: u32 },

    #[error("[ICAL-STRUCT-002] END:{found} at line {line} does not match open BEGIN:{expected}")]
    MismatchedEnd { expected: String, found: String, line: u32 },

    #[error("[ICAL-STRUCT-003] END:{name} at line {line} has no matching BEGIN")]
    UnmatchedEnd { name: String, line: u32 },

    #[error("[ICAL-STRUCT-004] input contains no VCALENDAR component")]
    MissingCalendar,

    #[error("[ICAL-RRULE-001] recurrence rule is unbounded and no range_end was supplied")]
    UnboundedRecurrenceWithoutRangeEnd,

    #[error("[ICAL-RRULE-002] component has no DTSTART; cannot expand recurrence")]
    MissingDtStart,

    #[error("[ICAL-IO-001] failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(inner) => inner.code(),
            Self::UnmatchedBegin { .. } => "ICAL-STRUCT-001",
            Self::MismatchedEnd { .. } => "ICAL-STRUCT-002",
            Self::UnmatchedEnd { .. } => "ICAL-STRUCT-003",
            Self::MissingCalendar => "ICAL-STRUCT-004",
            Self::UnboundedRecurrenceWithoutRangeEnd => "ICAL-RRULE-001",
            Self::MissingDtStart => "ICAL-RRULE-002",
            Self::Io { .. } => "ICAL-IO-001",
        }
    }
}

/// A single validator finding (§4.6): machine code, message, the
/// component/property it concerns, and a severity the caller interprets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFinding {
    pub code: &'static str,
    pub message: String,
    pub component: String,
    pub property: Option<String>,
    pub severity: Severity,
}

impl ValidationFinding {
    pub fn new(code: &'static str, message: impl Into<String>, component: impl Into<String>, severity: Severity) -> Self {
        Self {
            code,
            message: message.into(),
            component: component.into(),
            property: None,
            severity,
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }
}
