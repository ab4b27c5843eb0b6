/// A structural, type, or security failure raised while parsing iCalendar
/// text. Every variant carries a machine-readable code (§7 of the spec)
/// alongside a human message and, where the failure is line-oriented, the
/// 1-based content-line number and the raw line text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("[ICAL-PARSE-001] malformed folding at line {line}: {line_text:?}")]
    MalformedFolding { line: u32, line_text: String },

    #[error("[ICAL-PARSE-002] invalid property name at line {line}: {line_text:?}")]
    InvalidPropertyFormat { line: u32, line_text: String },

    #[error("[ICAL-PARSE-003] unclosed quoted string at line {line}: {line_text:?}")]
    UnclosedQuotedString { line: u32, line_text: String },

    #[error("[ICAL-PARSE-004] invalid RFC 6868 escape '^{escape}' at line {line}")]
    InvalidRfc6868Escape { line: u32, escape: char },

    #[error("[ICAL-TYPE-005] declared VALUE type does not match parsed value at line {line}: {message}")]
    TypeDeclarationMismatch { line: u32, message: String },

    #[error("[ICAL-TYPE-006] invalid {kind} value {raw:?} at line {line}: {message}")]
    ValueFormat {
        kind: &'static str,
        raw: String,
        message: String,
        line: u32,
    },

    #[error("[ICAL-SEC-001] nesting depth exceeded maximum of {max_depth}")]
    SecurityDepthExceeded { max_depth: usize },

    #[error("[ICAL-SEC-002] input contains an XML external entity declaration")]
    XxeAttempt,

    #[error("[ICAL-SEC-003] URI scheme '{scheme}' is not permitted")]
    InvalidScheme { scheme: String },

    #[error("[ICAL-SEC-004] URI host '{host}' resolves to a private or loopback address")]
    PrivateIp { host: String },

    #[error("[ICAL-SEC-005] data: URI payload of {size} bytes exceeds the {limit} byte ceiling")]
    DataUriTooLarge { size: usize, limit: usize },
}

impl SyntaxError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedFolding { .. } => "ICAL-PARSE-001",
            Self::InvalidPropertyFormat { .. } => "ICAL-PARSE-002",
            Self::UnclosedQuotedString { .. } => "ICAL-PARSE-003",
            Self::InvalidRfc6868Escape { .. } => "ICAL-PARSE-004",
            Self::TypeDeclarationMismatch { .. } => "ICAL-TYPE-005",
            Self::ValueFormat { .. } => "ICAL-TYPE-006",
            Self::SecurityDepthExceeded { .. } => "ICAL-SEC-001",
            Self::XxeAttempt => "ICAL-SEC-002",
            Self::InvalidScheme { .. } => "ICAL-SEC-003",
            Self::PrivateIp { .. } => "ICAL-SEC-004",
            Self::DataUriTooLarge { .. } => "ICAL-SEC-005",
        }
    }

    /// Security errors are never recoverable (§7): lenient mode must abort
    /// on these even though it collects everything else as a warning.
    pub fn is_security(&self) -> bool {
        matches!(
            self,
            Self::SecurityDepthExceeded { .. }
                | Self::XxeAttempt
                | Self::InvalidScheme { .. }
                | Self::PrivateIp { .. }
                | Self::DataUriTooLarge { .. }
        )
    }
}
