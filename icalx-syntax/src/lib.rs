pub mod error;
pub mod grammar;
pub mod line_codec;
pub mod content_line;
pub mod security;
pub mod values;

pub use error::SyntaxError;

/// Located input used by every nom combinator in this crate so that parse
/// failures can be traced back to a content-line number (§6 error surface).
pub type ParserInput<'a> = nom_locate::LocatedSpan<&'a str>;
pub type ParserResult<'a, O> = nom::IResult<ParserInput<'a>, O, ParserError<'a>>;

/// nom-facing error type. Distinct from [`SyntaxError`]: this one carries a
/// borrowed span so nom's combinators can build it cheaply while parsing;
/// [`ParserError::into_syntax_error`] converts it to the owned, public
/// error once parsing has concluded (successfully or not).
#[derive(Clone, Debug, PartialEq)]
pub struct ParserError<'a> {
    span: ParserInput<'a>,
    message: Option<String>,
    context: Vec<String>,
    rfc6868_escape: Option<char>,
}

impl<'a> ParserError<'a> {
    pub fn new(message: String, span: ParserInput<'a>) -> Self {
        Self {
            span,
            message: Some(message),
            context: Vec::new(),
            rfc6868_escape: None,
        }
    }

    /// Built when [`crate::grammar::param`] rejects an escape RFC 6868
    /// doesn't define, in strict mode. Carried separately from `message`
    /// so [`Self::into_syntax_error`] can surface the specific
    /// [`SyntaxError::InvalidRfc6868Escape`] variant rather than folding it
    /// into a generic parse failure.
    pub fn rfc6868(escape: char, span: ParserInput<'a>) -> Self {
        Self {
            span,
            message: Some(format!("invalid RFC 6868 escape '^{escape}'")),
            context: Vec::new(),
            rfc6868_escape: Some(escape),
        }
    }

    pub fn span(&self) -> &ParserInput<'a> {
        &self.span
    }

    pub fn line(&self) -> u32 {
        self.span.location_line()
    }

    pub fn line_text(&self) -> String {
        let fragment = *self.span.fragment();
        fragment.lines().next().unwrap_or(fragment).to_string()
    }

    pub fn message(&self) -> String {
        self.message.clone().unwrap_or_else(|| String::from("parse error"))
    }

    pub fn into_syntax_error(self) -> SyntaxError {
        let line = self.line();
        let line_text = self.line_text();

        if let Some(escape) = self.rfc6868_escape {
            SyntaxError::InvalidRfc6868Escape { line, escape }
        } else if self.context.iter().any(|c| c == "QUOTED-STRING") {
            SyntaxError::UnclosedQuotedString { line, line_text }
        } else {
            SyntaxError::InvalidPropertyFormat { line, line_text }
        }
    }
}

impl<'a> std::fmt::Display for ParserError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {} ({})", self.message(), self.line(), self.context.join(" <- "))
    }
}

impl<'a> nom::error::ParseError<ParserInput<'a>> for ParserError<'a> {
    fn from_error_kind(input: ParserInput<'a>, kind: nom::error::ErrorKind) -> Self {
        Self::new(format!("parse error {:?}", kind), input)
    }

    fn append(_input: ParserInput<'a>, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: ParserInput<'a>, unexpected: char) -> Self {
        Self::new(format!("unexpected character '{}'", unexpected), input)
    }
}

impl<'a> nom::error::ContextError<ParserInput<'a>> for ParserError<'a> {
    fn add_context(_input: ParserInput<'a>, context: &'static str, mut other: Self) -> Self {
        other.context.push(String::from(context));
        other
    }
}

impl<'a, E> nom::error::FromExternalError<ParserInput<'a>, E> for ParserError<'a>
where
    E: ToString,
{
    fn from_external_error(input: ParserInput<'a>, _kind: nom::error::ErrorKind, error: E) -> Self {
        Self::new(error.to_string(), input)
    }
}

/// Implemented by every value and content-line type in this crate: a
/// symmetric parse/format contract (spec §4.3's "dispatch table").
pub trait ICalendarEntity {
    fn parse_ical(input: ParserInput) -> ParserResult<Self>
    where
        Self: Sized;

    fn render_ical(&self) -> String;
}

impl<T> ICalendarEntity for Option<T>
where
    T: ICalendarEntity,
{
    fn parse_ical(input: ParserInput) -> ParserResult<Self> {
        T::parse_ical(input).map(|(remaining, parsed)| (remaining, Some(parsed)))
    }

    fn render_ical(&self) -> String {
        self.as_ref().map(|entity| entity.render_ical()).unwrap_or_default()
    }
}

/// Parses a value of `T` from a whole, already-unfolded string, requiring
/// the entire input to be consumed.
pub fn parse_complete<T: ICalendarEntity>(input: &str) -> Result<T, SyntaxError> {
    match nom::combinator::all_consuming(T::parse_ical)(ParserInput::new(input)) {
        Ok((_remaining, value)) => Ok(value),
        Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => Err(error.into_syntax_error()),
        Err(nom::Err::Incomplete(_)) => Err(SyntaxError::InvalidPropertyFormat {
            line: 1,
            line_text: input.lines().next().unwrap_or(input).to_string(),
        }),
    }
}

#[macro_export]
macro_rules! impl_icalendar_entity_traits {
    ($entity:ident) => {
        impl std::str::FromStr for $entity {
            type Err = $crate::SyntaxError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                $crate::parse_complete(input)
            }
        }

        impl std::fmt::Display for $entity {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.render_ical())
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod test_utils {
    #[macro_export]
    macro_rules! assert_parser_output {
        ($subject:expr, ($remaining:expr, $expected:expr $(,)*) $(,)*) => {
            let result = $subject;
            let Ok((remaining, parsed_value)) = result else {
                panic!("expected Ok, got: {:#?}", result);
            };
            pretty_assertions_sorted::assert_eq!(*remaining.fragment(), $remaining);
            pretty_assertions_sorted::assert_eq_sorted!(parsed_value, $expected);
        };
    }

    pub use assert_parser_output;
}
