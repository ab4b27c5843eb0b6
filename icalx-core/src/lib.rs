pub mod calendar;
pub mod component;
pub mod config;
pub mod error;
pub mod jcal;
pub mod property;
pub mod recurrence;
pub mod timezone;
pub mod validator;
pub mod views;

pub use calendar::{parse_calendar, parse_calendar_file, write_calendar, ParsedCalendar};
pub use component::{Component, ComponentKind};
pub use config::ParserConfig;
pub use error::{ModelError, Severity, ValidationFinding};
pub use property::Property;
pub use recurrence::{Occurrence, OccurrenceIter, RecurrenceInput};
pub use validator::validate;
pub use views::{VAlarmView, VEventView, VJournalView, VTodoView};
