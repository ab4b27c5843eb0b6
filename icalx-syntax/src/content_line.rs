//! Splits one unfolded logical line into `(name, parameters, value)` and
//! formats the inverse (spec §4.2). Adapted from the teacher's
//! `redical_ical::content_line`, generalized to decode/encode RFC 6868
//! escapes on parameter values.

use nom::combinator::{all_consuming, cut, map, opt};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::{preceded, terminated, tuple};

use crate::grammar::{colon, encode_caret_escapes, param, semicolon, value};
use crate::{impl_icalendar_entity_traits, ICalendarEntity, ParserInput, ParserResult};

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContentLineParam(pub String, pub String);

impl From<(String, String)> for ContentLineParam {
    fn from(pair: (String, String)) -> Self {
        ContentLineParam(pair.0, pair.1)
    }
}

impl ICalendarEntity for ContentLineParam {
    fn parse_ical(input: ParserInput) -> ParserResult<Self> {
        map(param(false), ContentLineParam::from)(input)
    }

    fn render_ical(&self) -> String {
        if self.1.is_empty() {
            self.0.clone()
        } else {
            format!("{}={}", self.0, quote_if_needed(&self.1))
        }
    }
}

impl_icalendar_entity_traits!(ContentLineParam);

/// Quote a parameter value if it contains `;`, `:`, or `,`, re-escaping
/// via RFC 6868 as it goes (the strict inverse of [`crate::grammar::param`]).
fn quote_if_needed(raw: &str) -> String {
    let needs_quoting = raw.contains(|c| matches!(c, ';' | ':' | ',')) || raw.contains('"') || raw.contains('\n');

    if needs_quoting {
        format!("\"{}\"", encode_caret_escapes(raw))
    } else {
        raw.to_string()
    }
}

/// An ordered list of parameters (duplicates are preserved verbatim; it
/// is [`crate::property::Property`]'s job to decide last-write-wins
/// semantics, not this type's).
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContentLineParams(pub Vec<ContentLineParam>);

impl From<Vec<ContentLineParam>> for ContentLineParams {
    fn from(params: Vec<ContentLineParam>) -> Self {
        ContentLineParams(params)
    }
}

impl ContentLineParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|param| param.0.eq_ignore_ascii_case(key))
            .map(|param| param.1.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|param| param.0.eq_ignore_ascii_case(key))
            .map(|param| param.1.as_str())
            .collect()
    }
}

impl ICalendarEntity for ContentLineParams {
    fn parse_ical(input: ParserInput) -> ParserResult<Self> {
        map(
            many0(preceded(semicolon, cut(ContentLineParam::parse_ical))),
            ContentLineParams::from,
        )(input)
    }

    fn render_ical(&self) -> String {
        let mut output = String::new();

        for param in &self.0 {
            output.push(';');
            output.push_str(&param.render_ical());
        }

        output
    }
}

impl_icalendar_entity_traits!(ContentLineParams);

/// `(name, parameters, raw value)`. The raw value is unescaped text: it
/// is handed to the value codec matching the declared or inferred kind.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContentLine {
    pub name: String,
    pub params: ContentLineParams,
    pub raw_value: String,
}

impl ContentLine {
    pub fn new(name: impl Into<String>, params: ContentLineParams, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params,
            raw_value: raw_value.into(),
        }
    }
}

impl From<(ParserInput<'_>, ContentLineParams, ParserInput<'_>)> for ContentLine {
    fn from(parts: (ParserInput, ContentLineParams, ParserInput)) -> Self {
        ContentLine {
            name: parts.0.fragment().to_ascii_uppercase(),
            params: parts.1,
            raw_value: parts.2.fragment().to_string(),
        }
    }
}

impl ICalendarEntity for ContentLine {
    fn parse_ical(input: ParserInput) -> ParserResult<Self> {
        context(
            "CONTENTLINE",
            map(
                tuple((
                    crate::grammar::name,
                    ContentLineParams::parse_ical,
                    terminated(preceded(colon, value), opt(crate::grammar::crlf)),
                )),
                ContentLine::from,
            ),
        )(input)
    }

    fn render_ical(&self) -> String {
        format!("{}{}:{}", self.name, self.params.render_ical(), self.raw_value)
    }
}

impl_icalendar_entity_traits!(ContentLine);

/// Strict-aware parameter-section parse, used by [`parse_lines`] so
/// `ParserConfig::strict` can reach RFC 6868 decoding (the
/// [`ICalendarEntity`] trait's `parse_ical` always parses leniently).
fn parse_params(strict: bool) -> impl FnMut(ParserInput) -> ParserResult<ContentLineParams> {
    move |input: ParserInput| {
        map(
            many0(preceded(semicolon, cut(map(param(strict), ContentLineParam::from)))),
            ContentLineParams::from,
        )(input)
    }
}

fn parse_content_line(strict: bool) -> impl FnMut(ParserInput) -> ParserResult<ContentLine> {
    move |input: ParserInput| {
        context(
            "CONTENTLINE",
            map(
                tuple((
                    crate::grammar::name,
                    parse_params(strict),
                    terminated(preceded(colon, value), opt(crate::grammar::crlf)),
                )),
                ContentLine::from,
            ),
        )(input)
    }
}

/// A parsed line's error with its 1-based content-line number restored:
/// `nom_locate` resets to line 1 for every independently-parsed logical
/// line, so the line number has to be patched back in afterwards.
fn with_line_number(error: crate::SyntaxError, line_number: u32, line_text: &str) -> crate::SyntaxError {
    use crate::SyntaxError::*;

    match error {
        MalformedFolding { .. } => MalformedFolding { line: line_number, line_text: line_text.to_string() },
        InvalidPropertyFormat { .. } => InvalidPropertyFormat { line: line_number, line_text: line_text.to_string() },
        UnclosedQuotedString { .. } => UnclosedQuotedString { line: line_number, line_text: line_text.to_string() },
        InvalidRfc6868Escape { escape, .. } => InvalidRfc6868Escape { line: line_number, escape },
        other => other,
    }
}

/// Parses every logical line of an already-unfolded document. `strict`
/// gates RFC 6868 parameter-escape rejection (spec §4.2).
pub fn parse_lines(logical_lines: &[String], strict: bool) -> Result<Vec<ContentLine>, crate::SyntaxError> {
    logical_lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let line_number = (index + 1) as u32;
            match all_consuming(parse_content_line(strict))(ParserInput::new(line)) {
                Ok((_remaining, value)) => Ok(value),
                Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => {
                    Err(with_line_number(error.into_syntax_error(), line_number, line))
                }
                Err(nom::Err::Incomplete(_)) => Err(crate::SyntaxError::InvalidPropertyFormat {
                    line: line_number,
                    line_text: line.clone(),
                }),
            }
        })
        .collect()
}
