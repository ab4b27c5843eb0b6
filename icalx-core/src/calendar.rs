//! Calendar-level parse/write entry points: raw bytes (or text) in,
//! assembled and validated `Component` tree out, and back. Wires
//! together `LineCodec -> ContentLineParser -> ObjectModel` the way
//! spec §9 describes the overall pipeline.

use std::path::Path;

use icalx_syntax::content_line::parse_lines;
use icalx_syntax::line_codec::{fold_all, unfold};
use icalx_syntax::SyntaxError;

use crate::component::{assemble, disassemble, Component, ComponentKind};
use crate::config::ParserConfig;
use crate::error::ModelError;
use crate::error::ValidationFinding;
use crate::validator::validate;

/// A parsed calendar: the root `VCALENDAR` component, whatever validator
/// findings its tree produced, and every recoverable syntax error lenient
/// mode downgraded to a warning instead of aborting on (§7: "a recoverable
/// parse or type error is collected as a warning on the parser"). Parsing
/// never fails on a validation problem or a warning -- only on malformed
/// input or a security violation -- so callers decide what to do with
/// `findings`/`warnings`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCalendar {
    pub root: Component,
    pub findings: Vec<ValidationFinding>,
    pub warnings: Vec<SyntaxError>,
}

impl ParsedCalendar {
    pub fn warnings(&self) -> &[SyntaxError] {
        &self.warnings
    }
}

/// Parses a whole `.ics` document (already in memory) into a validated
/// component tree.
pub fn parse_calendar(input: &str, config: &ParserConfig) -> Result<ParsedCalendar, ModelError> {
    let gate = config.security_gate();
    gate.check_xxe(input.as_bytes())?;

    let logical_lines = unfold(input)?;
    let content_lines = parse_lines(&logical_lines, config.strict)?;
    let (root, warnings) = assemble(&content_lines, config.strict, &gate)?;

    if root.kind != ComponentKind::VCalendar {
        return Err(ModelError::MissingCalendar);
    }

    let findings = validate(&root);

    Ok(ParsedCalendar { root, findings, warnings })
}

/// Reads a whole `.ics` file into memory and parses it (§6: "a path is
/// read into memory, run through the XXE check, then passed to the
/// in-memory parser"). The XXE check runs twice in practice -- once here
/// over the raw bytes, once again inside [`parse_calendar`] -- which is
/// harmless and keeps this function a thin wrapper rather than a
/// duplicate parsing pipeline.
pub fn parse_calendar_file(path: &Path, config: &ParserConfig) -> Result<ParsedCalendar, ModelError> {
    let bytes = std::fs::read(path).map_err(|err| ModelError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    config.security_gate().check_xxe(&bytes)?;

    let text = String::from_utf8_lossy(&bytes);
    parse_calendar(&text, config)
}

/// Writes a component tree back out as folded `.ics` text.
pub fn write_calendar(component: &Component) -> String {
    let lines = disassemble(component);
    let rendered: Vec<String> = lines.iter().map(|line| line.render_ical()).collect();
    fold_all(rendered.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "BEGIN:VCALENDAR\r\nPRODID:-//test//\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nDTSTAMP:20240101T000000Z\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    #[test]
    fn parses_a_minimal_calendar_cleanly() {
        let parsed = parse_calendar(DOCUMENT, &ParserConfig::default()).unwrap();
        assert_eq!(parsed.root.kind, ComponentKind::VCalendar);
        assert!(parsed.findings.is_empty());
        assert!(parsed.warnings().is_empty());
    }

    #[test]
    fn lenient_mode_collects_warnings_instead_of_failing() {
        let document = "BEGIN:VCALENDAR\r\nPRODID:-//test//\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nDTSTAMP:20240101T000000Z\r\nDTSTART:20240101T090000Z\r\nSUMMARY;VALUE=INTEGER:Team sync\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let config = ParserConfig::default().with_strict(false);
        let parsed = parse_calendar(document, &config).unwrap();
        assert!(!parsed.warnings().is_empty());
    }

    #[test]
    fn round_trips_through_write_and_parse() {
        let parsed = parse_calendar(DOCUMENT, &ParserConfig::default()).unwrap();
        let rendered = write_calendar(&parsed.root);
        let reparsed = parse_calendar(&rendered, &ParserConfig::default()).unwrap();
        assert_eq!(reparsed.root, parsed.root);
    }

    #[test]
    fn non_calendar_root_is_rejected() {
        let document = "BEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\n";
        assert!(matches!(parse_calendar(document, &ParserConfig::default()), Err(ModelError::MissingCalendar)));
    }

    #[test]
    fn xxe_attempt_is_rejected_before_parsing() {
        let document = "BEGIN:VCALENDAR\r\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\">\r\nEND:VCALENDAR\r\n";
        assert!(parse_calendar(document, &ParserConfig::default()).is_err());
    }

    #[test]
    fn parse_calendar_file_reads_and_parses() {
        let path = std::env::temp_dir().join(format!("icalx-core-test-{}.ics", std::process::id()));
        std::fs::write(&path, DOCUMENT).unwrap();

        let parsed = parse_calendar_file(&path, &ParserConfig::default()).unwrap();
        assert_eq!(parsed.root.kind, ComponentKind::VCalendar);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_calendar_file_reports_missing_file() {
        let path = std::env::temp_dir().join("icalx-core-test-does-not-exist.ics");
        assert!(matches!(parse_calendar_file(&path, &ParserConfig::default()), Err(ModelError::Io { .. })));
    }
}
