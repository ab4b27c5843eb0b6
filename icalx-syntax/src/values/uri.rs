//! URI: arbitrary URI syntax, gated by [`crate::security::SecurityGate`]
//! at the call site (see [`crate::values::Value::parse`]). This module
//! just holds the handful of scheme-sniffing helpers shared with
//! CAL-ADDRESS, which is a URI with autoprefixing on write.

pub fn scheme_of(uri: &str) -> Option<&str> {
    uri.split_once(':').map(|(scheme, _rest)| scheme)
}

/// True if `uri` already looks like it carries a URI scheme, i.e. it has
/// a `:` before any character that couldn't appear in a scheme name.
pub fn has_scheme(uri: &str) -> bool {
    let prefix: String = uri.chars().take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')).collect();
    uri[prefix.len()..].starts_with(':')
}
