//! Low-level character-class and token parsers shared by the content-line
//! parser and every value codec. Adapted from the teacher's hand-rolled
//! nom grammar (redical_ical/src/grammar.rs), trimmed to what this spec
//! actually needs and extended with RFC 6868 parameter-value decoding.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1, take_while_m_n};
use nom::character::complete::char;
use nom::combinator::{cut, map, opt, verify};
use nom::error::context;
use nom::multi::separated_list1;
use nom::sequence::{delimited, preceded};

use crate::{ParserInput, ParserResult};

pub fn is_htab_char(c: char) -> bool {
    c == '\t'
}

pub fn is_space_char(c: char) -> bool {
    c == ' '
}

pub fn is_wsp_char(c: char) -> bool {
    is_space_char(c) || is_htab_char(c)
}

pub fn wsp(input: ParserInput) -> ParserResult<ParserInput> {
    take_while_m_n(1, 1, is_wsp_char)(input)
}

pub fn is_cr_char(c: char) -> bool {
    c == '\r'
}

pub fn is_lf_char(c: char) -> bool {
    c == '\n'
}

pub fn is_dquote_char(c: char) -> bool {
    c == '"'
}

/// A single logical-line terminator. By the time text reaches this crate
/// it has already been through [`crate::line_codec::unfold`], which
/// normalizes CR/LF/CRLF into CRLF, so only CRLF is recognized here.
pub fn crlf(input: ParserInput) -> ParserResult<ParserInput> {
    tag("\r\n")(input)
}

/// `iana-token` / `x-name` characters: ALPHA / DIGIT / "-"
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

pub fn name(input: ParserInput) -> ParserResult<ParserInput> {
    context(
        "NAME",
        verify(take_while1(is_name_char), |span: &ParserInput| {
            span.fragment().chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        }),
    )(input)
}

pub fn colon(input: ParserInput) -> ParserResult<ParserInput> {
    context("COLON", tag(":"))(input)
}

pub fn semicolon(input: ParserInput) -> ParserResult<ParserInput> {
    context("SEMICOLON", tag(";"))(input)
}

pub fn comma(input: ParserInput) -> ParserResult<ParserInput> {
    context("COMMA", tag(","))(input)
}

pub fn equals(input: ParserInput) -> ParserResult<ParserInput> {
    context("EQUALS", tag("="))(input)
}

/// `QSAFE-CHAR`: any character except CTL and DQUOTE.
fn is_qsafe_char(c: char) -> bool {
    !c.is_control() && c != '"'
}

/// Decodes RFC 6868 parameter-value escapes: `^n` -> LF, `^^` -> `^`,
/// `^'` -> `"`. Any other `^x` is passed through verbatim in lenient mode;
/// strict mode rejects it (see [`decode_caret_escapes_strict`]).
pub fn decode_caret_escapes(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '^' {
            output.push(c);
            continue;
        }

        match chars.peek() {
            Some('n') => {
                output.push('\n');
                chars.next();
            }
            Some('^') => {
                output.push('^');
                chars.next();
            }
            Some('\'') => {
                output.push('"');
                chars.next();
            }
            _ => output.push('^'),
        }
    }

    output
}

/// Strict variant: returns the offending escape character on any `^x`
/// other than the three defined by RFC 6868.
pub fn decode_caret_escapes_strict(input: &str) -> Result<String, char> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '^' {
            output.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => output.push('\n'),
            Some('^') => output.push('^'),
            Some('\'') => output.push('"'),
            Some(other) => return Err(other),
            None => return Err('\0'),
        }
    }

    Ok(output)
}

/// Re-encodes a decoded parameter value back to its RFC 6868 quoted form:
/// `^` -> `^^`, LF -> `^n`, `"` -> `^'`.
pub fn encode_caret_escapes(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '^' => output.push_str("^^"),
            '\n' => output.push_str("^n"),
            '"' => output.push_str("^'"),
            other => output.push(other),
        }
    }

    output
}

/// A single `param-value`, kept apart from its quoting so [`param`] can
/// decide whether to RFC 6868-decode it: escaping only applies inside
/// `QUOTED-STRING` (§4.2).
enum ParamValueRaw {
    Quoted(String),
    Unquoted(String),
}

fn quoted_string_raw(input: ParserInput) -> ParserResult<String> {
    context(
        "QUOTED-STRING",
        map(
            delimited(char('"'), take_while(is_qsafe_char), cut(char('"'))),
            |span: ParserInput| span.fragment().to_string(),
        ),
    )(input)
}

/// `SAFE-CHAR`: any character except CTL, DQUOTE, ";", ":", ",".
fn is_param_safe_char(c: char) -> bool {
    !c.is_control() && !matches!(c, '"' | ';' | ':' | ',')
}

fn unquoted_param_value(input: ParserInput) -> ParserResult<String> {
    map(take_while(is_param_safe_char), |span: ParserInput| span.fragment().to_string())(input)
}

fn param_value_raw(input: ParserInput) -> ParserResult<ParamValueRaw> {
    alt((
        map(quoted_string_raw, ParamValueRaw::Quoted),
        map(unquoted_param_value, ParamValueRaw::Unquoted),
    ))(input)
}

/// `param-value *("," param-value)` — a single `KEY=VAL[,VAL...]`.
fn param_value_list_raw(input: ParserInput) -> ParserResult<Vec<ParamValueRaw>> {
    separated_list1(comma, param_value_raw)(input)
}

/// One `;KEY=VAL` or bare `;KEY` (permitted, empty-string value per §4.2).
/// Returns the owned `(key, value)` pair with any quoted segment RFC
/// 6868-decoded: leniently when `strict` is false, with
/// [`decode_caret_escapes_strict`] rejecting unknown escapes when it is
/// true (spec §4.2: "Any other `^x`: strict error, lenient passthrough").
pub fn param(strict: bool) -> impl FnMut(ParserInput) -> ParserResult<(String, String)> {
    move |input: ParserInput| {
        let (input, key) = context("PARAM", name)(input)?;
        let (input, raw_values) = opt(preceded(equals, param_value_list_raw))(input)?;

        let value = match raw_values {
            None => String::new(),
            Some(segments) => {
                let mut parts = Vec::with_capacity(segments.len());
                for segment in segments {
                    match segment {
                        ParamValueRaw::Quoted(raw) if strict => match decode_caret_escapes_strict(&raw) {
                            Ok(decoded) => parts.push(decoded),
                            Err(escape) => return Err(nom::Err::Failure(crate::ParserError::rfc6868(escape, input))),
                        },
                        ParamValueRaw::Quoted(raw) => parts.push(decode_caret_escapes(&raw)),
                        ParamValueRaw::Unquoted(raw) => parts.push(raw),
                    }
                }
                parts.join(",")
            }
        };

        Ok((input, (key.fragment().to_ascii_uppercase(), value)))
    }
}

/// Everything after the name/params colon, up to (but excluding) the line
/// terminator. This crate does not interpret escapes here -- that's each
/// value codec's job (§4.3).
pub fn value(input: ParserInput) -> ParserResult<ParserInput> {
    context("VALUE", take_while(|c| !is_cr_char(c) && !is_lf_char(c)))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rfc6868_escapes() {
        assert_eq!(decode_caret_escapes("a^nb^^c^'d"), "a\nb^c\"d");
    }

    #[test]
    fn strict_rejects_unknown_escape() {
        assert_eq!(decode_caret_escapes_strict("a^xb"), Err('x'));
    }

    #[test]
    fn parses_name() {
        let (remaining, parsed) = name("DTSTART;TZID=X:val".into()).unwrap();
        assert_eq!(*parsed.fragment(), "DTSTART");
        assert_eq!(*remaining.fragment(), ";TZID=X:val");
    }
}
