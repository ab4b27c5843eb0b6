//! CAL-ADDRESS: a URI, conventionally `mailto:`. Per the spec's resolved
//! open question (§9), the writer does not prefix `mailto:` onto a value
//! that already carries a scheme.

use crate::values::uri;

pub fn parse(raw: &str) -> String {
    raw.to_string()
}

pub fn format(value: &str) -> String {
    if uri::has_scheme(value) {
        value.to_string()
    } else {
        format!("mailto:{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_bare_address() {
        assert_eq!(format("alice@example.com"), "mailto:alice@example.com");
    }

    #[test]
    fn does_not_double_prefix() {
        assert_eq!(format("mailto:alice@example.com"), "mailto:alice@example.com");
    }

    #[test]
    fn leaves_other_schemes_alone() {
        assert_eq!(format("urn:uuid:abc"), "urn:uuid:abc");
    }
}
