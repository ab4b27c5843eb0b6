//! Typed convenience accessors over [`Component`] ([SUPPLEMENT] "Component
//! convenience accessors"). Each view borrows a component and exposes its
//! well-known properties as `Option<&Value>`/typed getters, the way the
//! teacher's `redical_core::event::Event` exposes `ScheduleProperties`,
//! but generalized over the one generic `Property` representation
//! instead of one Rust struct per iCalendar property name.

use icalx_syntax::values::Value;

use crate::component::{Component, ComponentKind};
use crate::property::Property;

fn value_of<'a>(component: &'a Component, name: &str) -> Option<&'a Value> {
    component.get_property(name).map(|p| &p.value)
}

fn text_of<'a>(component: &'a Component, name: &str) -> Option<&'a str> {
    match value_of(component, name)? {
        Value::Text(values) => values.first().map(|s| s.as_str()),
        _ => None,
    }
}

/// Read-only view over a `VEVENT`.
pub struct VEventView<'a>(pub &'a Component);

impl<'a> VEventView<'a> {
    pub fn new(component: &'a Component) -> Option<Self> {
        (component.kind == ComponentKind::VEvent).then_some(Self(component))
    }

    pub fn uid(&self) -> Option<&'a str> {
        text_of(self.0, "UID")
    }

    pub fn summary(&self) -> Option<&'a str> {
        text_of(self.0, "SUMMARY")
    }

    pub fn description(&self) -> Option<&'a Property> {
        crate::validator::effective_description(self.0)
    }

    pub fn dtstart(&self) -> Option<&'a Value> {
        value_of(self.0, "DTSTART")
    }

    pub fn dtend(&self) -> Option<&'a Value> {
        value_of(self.0, "DTEND")
    }

    pub fn status(&self) -> Option<&'a str> {
        text_of(self.0, "STATUS")
    }

    pub fn rrules(&self) -> Vec<&'a Property> {
        self.0.get_all_properties("RRULE")
    }

    pub fn alarms(&self) -> Vec<&'a Component> {
        self.0.get_children("VALARM")
    }
}

/// Read-only view over a `VTODO`.
pub struct VTodoView<'a>(pub &'a Component);

impl<'a> VTodoView<'a> {
    pub fn new(component: &'a Component) -> Option<Self> {
        (component.kind == ComponentKind::VTodo).then_some(Self(component))
    }

    pub fn uid(&self) -> Option<&'a str> {
        text_of(self.0, "UID")
    }

    pub fn due(&self) -> Option<&'a Value> {
        value_of(self.0, "DUE")
    }

    pub fn status(&self) -> Option<&'a str> {
        text_of(self.0, "STATUS")
    }

    pub fn priority(&self) -> Option<i64> {
        match value_of(self.0, "PRIORITY")? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn percent_complete(&self) -> Option<i64> {
        match value_of(self.0, "PERCENT-COMPLETE")? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// Read-only view over a `VJOURNAL`.
pub struct VJournalView<'a>(pub &'a Component);

impl<'a> VJournalView<'a> {
    pub fn new(component: &'a Component) -> Option<Self> {
        (component.kind == ComponentKind::VJournal).then_some(Self(component))
    }

    pub fn uid(&self) -> Option<&'a str> {
        text_of(self.0, "UID")
    }

    pub fn status(&self) -> Option<&'a str> {
        text_of(self.0, "STATUS")
    }
}

/// Read-only view over a `VALARM`.
pub struct VAlarmView<'a>(pub &'a Component);

impl<'a> VAlarmView<'a> {
    pub fn new(component: &'a Component) -> Option<Self> {
        (component.kind == ComponentKind::VAlarm).then_some(Self(component))
    }

    pub fn action(&self) -> Option<&'a str> {
        text_of(self.0, "ACTION")
    }

    pub fn trigger(&self) -> Option<&'a Value> {
        value_of(self.0, "TRIGGER")
    }
}
