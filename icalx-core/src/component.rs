//! The object model's component tree (spec §3, §4.5). A node is a name, an
//! insertion-ordered list of properties, and an insertion-ordered list of
//! children. Parent back-links are deliberately dropped in favor of
//! passing context down explicitly (§9 design note): the teacher uses
//! mutable parent pointers (`redical_core::event::Event` holds its
//! `Calendar` context via lookups, not a pointer), which doesn't translate
//! cleanly to a systems language without unsafe or `Rc<RefCell<_>>`
//! ceremony the spec doesn't otherwise need.

use icalx_syntax::security::SecurityGate;
use icalx_syntax::{ICalendarEntity, SyntaxError};

use crate::error::ModelError;
use crate::property::Property;

/// The closed set of recognized component names (§4.5/[SUPPLEMENT]),
/// plus `Generic` for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    VCalendar,
    VEvent,
    VTodo,
    VJournal,
    VFreeBusy,
    VTimeZone,
    Standard,
    Daylight,
    VAlarm,
    VAvailability,
    Available,
    Participant,
    Generic(String),
}

impl ComponentKind {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::VCalendar,
            "VEVENT" => Self::VEvent,
            "VTODO" => Self::VTodo,
            "VJOURNAL" => Self::VJournal,
            "VFREEBUSY" => Self::VFreeBusy,
            "VTIMEZONE" => Self::VTimeZone,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            "VALARM" => Self::VAlarm,
            "VAVAILABILITY" => Self::VAvailability,
            "AVAILABLE" => Self::Available,
            "PARTICIPANT" => Self::Participant,
            other => Self::Generic(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::VCalendar => "VCALENDAR",
            Self::VEvent => "VEVENT",
            Self::VTodo => "VTODO",
            Self::VJournal => "VJOURNAL",
            Self::VFreeBusy => "VFREEBUSY",
            Self::VTimeZone => "VTIMEZONE",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::VAlarm => "VALARM",
            Self::VAvailability => "VAVAILABILITY",
            Self::Available => "AVAILABLE",
            Self::Participant => "PARTICIPANT",
            Self::Generic(name) => name,
        }
    }
}

/// A node in the object model: a component name, its properties in
/// insertion order, and its children in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    properties: Vec<Property>,
    children: Vec<Component>,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Removes every property with this name; returns how many were
    /// removed.
    pub fn remove_property(&mut self, name: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| !p.name.eq_ignore_ascii_case(name));
        before - self.properties.len()
    }

    /// Last-write-wins lookup (§3).
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().rev().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Insertion-ordered "get all" (§3).
    pub fn get_all_properties(&self, name: &str) -> Vec<&Property> {
        self.properties.iter().filter(|p| p.name.eq_ignore_ascii_case(name)).collect()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| !c.kind.name().eq_ignore_ascii_case(name));
        before - self.children.len()
    }

    pub fn children(&self) -> &[Component] {
        &self.children
    }

    pub fn get_children(&self, name: &str) -> Vec<&Component> {
        self.children.iter().filter(|c| c.kind.name().eq_ignore_ascii_case(name)).collect()
    }

    pub fn get_children_of_kind(&self, kind: &ComponentKind) -> Vec<&Component> {
        self.children.iter().filter(|c| &c.kind == kind).collect()
    }
}

/// Parses a flat stream of content lines (no folding applied -- that's
/// `line_codec`'s job) into a component tree, honoring `BEGIN`/`END` and
/// enforcing the depth cap at every nested `BEGIN` (spec §4.4). Returns
/// the tree alongside every warning recorded along the way (empty unless
/// `strict` is false and something recoverable needed downgrading).
pub fn assemble(
    lines: &[icalx_syntax::content_line::ContentLine],
    strict: bool,
    gate: &SecurityGate,
) -> Result<(Component, Vec<SyntaxError>), ModelError> {
    let mut stack: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;
    let mut warnings: Vec<SyntaxError> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let line_no = (index + 1) as u32;

        if line.name.eq_ignore_ascii_case("BEGIN") {
            gate.check_depth(stack.len())?;
            stack.push(Component::new(ComponentKind::from_name(&line.raw_value)));
            continue;
        }

        if line.name.eq_ignore_ascii_case("END") {
            let Some(finished) = stack.pop() else {
                return Err(ModelError::UnmatchedEnd {
                    name: line.raw_value.clone(),
                    line: line_no,
                });
            };

            if !finished.kind.name().eq_ignore_ascii_case(&line.raw_value) {
                return Err(ModelError::MismatchedEnd {
                    expected: finished.kind.name().to_string(),
                    found: line.raw_value.clone(),
                    line: line_no,
                });
            }

            match stack.last_mut() {
                Some(parent) => parent.add_child(finished),
                None => root = Some(finished),
            }
            continue;
        }

        let (property, mut property_warnings) = Property::from_content_line(line.clone(), strict, Some(gate))?;
        warnings.append(&mut property_warnings);

        match stack.last_mut() {
            Some(current) => current.add_property(property),
            None => {
                return Err(SyntaxError::InvalidPropertyFormat {
                    line: line_no,
                    line_text: line.render_ical(),
                }
                .into())
            }
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(ModelError::UnmatchedBegin {
            name: unclosed.kind.name().to_string(),
            line: lines.len() as u32,
        });
    }

    let root = root.ok_or_else(|| {
        ModelError::from(SyntaxError::InvalidPropertyFormat {
            line: 0,
            line_text: String::new(),
        })
    })?;

    Ok((root, warnings))
}

/// Writes a component tree back into a flat stream of content lines,
/// innermost-out, wrapping it in its own `BEGIN`/`END` pair.
pub fn disassemble(component: &Component) -> Vec<icalx_syntax::content_line::ContentLine> {
    use icalx_syntax::content_line::{ContentLine, ContentLineParams};

    let mut lines = vec![ContentLine::new("BEGIN", ContentLineParams::default(), component.kind.name())];

    for property in component.properties() {
        lines.push(property.render());
    }

    for child in component.children() {
        lines.extend(disassemble(child));
    }

    lines.push(ContentLine::new("END", ContentLineParams::default(), component.kind.name()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalx_syntax::content_line::parse_lines;

    fn assembled(lines: &[&str]) -> Component {
        let logical: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let parsed = parse_lines(&logical, true).unwrap();
        assemble(&parsed, true, &SecurityGate::default()).unwrap().0
    }

    #[test]
    fn assembles_nested_tree() {
        let root = assembled(&[
            "BEGIN:VCALENDAR",
            "PRODID:-//test//",
            "VERSION:2.0",
            "BEGIN:VEVENT",
            "UID:1",
            "DTSTART:20240101T090000Z",
            "END:VEVENT",
            "END:VCALENDAR",
        ]);

        assert_eq!(root.kind, ComponentKind::VCalendar);
        assert_eq!(root.get_property("PRODID").unwrap().raw_value, "-//test//");
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].kind, ComponentKind::VEvent);
    }

    #[test]
    fn last_write_wins_on_duplicate_properties() {
        let root = assembled(&["BEGIN:VEVENT", "SUMMARY:first", "SUMMARY:second", "END:VEVENT"]);
        assert_eq!(root.get_property("SUMMARY").unwrap().raw_value, "second");
        assert_eq!(root.get_all_properties("SUMMARY").len(), 2);
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let logical = vec!["BEGIN:VEVENT".to_string(), "END:VTODO".to_string()];
        let parsed = parse_lines(&logical, true).unwrap();
        let err = assemble(&parsed, true, &SecurityGate::default()).unwrap_err();
        assert!(matches!(err, ModelError::MismatchedEnd { .. }));
    }

    #[test]
    fn unmatched_end_is_rejected() {
        let logical = vec!["END:VEVENT".to_string()];
        let parsed = parse_lines(&logical, true).unwrap();
        let err = assemble(&parsed, true, &SecurityGate::default()).unwrap_err();
        assert!(matches!(err, ModelError::UnmatchedEnd { .. }));
    }

    #[test]
    fn unmatched_begin_is_rejected() {
        let logical = vec!["BEGIN:VEVENT".to_string(), "UID:1".to_string()];
        let parsed = parse_lines(&logical, true).unwrap();
        let err = assemble(&parsed, true, &SecurityGate::default()).unwrap_err();
        assert!(matches!(err, ModelError::UnmatchedBegin { .. }));
    }

    #[test]
    fn depth_cap_is_enforced() {
        let mut logical = Vec::new();
        for _ in 0..3 {
            logical.push("BEGIN:VCALENDAR".to_string());
        }
        for _ in 0..3 {
            logical.push("END:VCALENDAR".to_string());
        }
        let parsed = parse_lines(&logical, true).unwrap();
        let gate = SecurityGate::new(2, Default::default(), 1024);
        assert!(assemble(&parsed, true, &gate).is_err());
    }
}
