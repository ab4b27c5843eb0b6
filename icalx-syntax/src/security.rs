//! Depth caps, URI allow-listing, XXE pattern detection, and text
//! sanitization (spec §4.4). New relative to the teacher: `redical_ical`
//! never receives whole untrusted `.ics` documents (it's fed individual
//! redis-stored properties), so this module has no direct teacher
//! counterpart. It is written in the teacher's idiom: a small config
//! struct plus pure functions over it, the same shape as this crate's
//! `ContentLineParams`.

use std::collections::HashSet;

use crate::error::SyntaxError;

#[derive(Debug, Clone)]
pub struct SecurityGate {
    pub max_depth: usize,
    pub allowed_schemes: HashSet<String>,
    pub max_data_uri_size: usize,
}

impl Default for SecurityGate {
    fn default() -> Self {
        Self {
            max_depth: 100,
            allowed_schemes: ["http", "https", "mailto", "tel", "urn", "data"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_data_uri_size: 1_048_576,
        }
    }
}

impl SecurityGate {
    pub fn new(max_depth: usize, allowed_schemes: HashSet<String>, max_data_uri_size: usize) -> Self {
        Self {
            max_depth,
            allowed_schemes,
            max_data_uri_size,
        }
    }

    /// Raises `SecurityDepthExceeded` when pushing one more `BEGIN` would
    /// put the tree past `max_depth`. `current_depth` is the depth of the
    /// parent the new component would be nested under (root = 0).
    pub fn check_depth(&self, current_depth: usize) -> Result<(), SyntaxError> {
        if current_depth >= self.max_depth {
            Err(SyntaxError::SecurityDepthExceeded { max_depth: self.max_depth })
        } else {
            Ok(())
        }
    }

    /// Aborts before any parsing begins if the raw bytes contain an XML
    /// external entity declaration. This is a lexical check, not an XML
    /// parse: iCalendar text has no business containing `<!ENTITY` at
    /// all, so its mere presence is treated as an attack signature.
    pub fn check_xxe(&self, raw: &[u8]) -> Result<(), SyntaxError> {
        const NEEDLE: &[u8] = b"<!ENTITY";

        if raw.windows(NEEDLE.len()).any(|window| window == NEEDLE) {
            Err(SyntaxError::XxeAttempt)
        } else {
            Ok(())
        }
    }

    pub fn validate_uri(&self, uri: &str) -> Result<(), SyntaxError> {
        let scheme = uri
            .split_once(':')
            .map(|(scheme, _rest)| scheme)
            .unwrap_or(uri)
            .to_ascii_lowercase();

        if scheme == "file" {
            return Err(SyntaxError::InvalidScheme { scheme });
        }

        if !self.allowed_schemes.contains(&scheme) {
            return Err(SyntaxError::InvalidScheme { scheme });
        }

        if scheme == "http" || scheme == "https" {
            self.check_private_host(uri)?;
        }

        if scheme == "data" {
            self.check_data_uri_size(uri)?;
        }

        Ok(())
    }

    fn check_private_host(&self, uri: &str) -> Result<(), SyntaxError> {
        let after_scheme = uri.splitn(2, "://").nth(1).unwrap_or("");
        let host = after_scheme
            .split(|c| c == '/' || c == ':' || c == '?' || c == '#')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if host == "localhost" || is_private_ipv4(&host) {
            return Err(SyntaxError::PrivateIp { host });
        }

        Ok(())
    }

    fn check_data_uri_size(&self, uri: &str) -> Result<(), SyntaxError> {
        // data:[<mediatype>][;base64],<payload>
        let payload = uri.split_once(',').map(|(_, payload)| payload).unwrap_or("");
        let size = payload.len();

        if size > self.max_data_uri_size {
            Err(SyntaxError::DataUriTooLarge {
                size,
                limit: self.max_data_uri_size,
            })
        } else {
            Ok(())
        }
    }
}

fn is_private_ipv4(host: &str) -> bool {
    let octets: Vec<&str> = host.split('.').collect();

    if octets.len() != 4 {
        return false;
    }

    let parsed: Option<Vec<u8>> = octets.iter().map(|o| o.parse::<u8>().ok()).collect();
    let Some(parsed) = parsed else { return false };

    match parsed[..] {
        [127, ..] => true,
        [10, ..] => true,
        [192, 168, ..] => true,
        [172, b, ..] if (16..=31).contains(&b) => true,
        _ => false,
    }
}

/// Strips NUL bytes and escapes remaining control bytes (other than TAB,
/// LF, CR) as `\xHH`, leaving multi-byte UTF-8 sequences untouched.
pub fn sanitize_text(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '\0' => {}
            '\t' | '\n' | '\r' => output.push(c),
            c if (c as u32) < 0x20 => output.push_str(&format!("\\x{:02X}", c as u32)),
            c => output.push(c),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_file_scheme() {
        let gate = SecurityGate::default();
        assert_eq!(
            gate.validate_uri("file:///etc/passwd"),
            Err(SyntaxError::InvalidScheme { scheme: "file".into() })
        );
    }

    #[test]
    fn rejects_private_hosts() {
        let gate = SecurityGate::default();
        for uri in [
            "http://localhost/x",
            "http://127.0.0.1/x",
            "http://10.1.2.3/x",
            "http://192.168.1.1/x",
            "http://172.16.0.5/x",
        ] {
            assert!(gate.validate_uri(uri).is_err(), "{uri} should be rejected");
        }
    }

    #[test]
    fn accepts_public_https() {
        let gate = SecurityGate::default();
        assert!(gate.validate_uri("https://example.com/cal.ics").is_ok());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let gate = SecurityGate::default();
        assert_eq!(
            gate.validate_uri("ftp://example.com/x"),
            Err(SyntaxError::InvalidScheme { scheme: "ftp".into() })
        );
    }

    #[test]
    fn rejects_oversized_data_uri() {
        let gate = SecurityGate::new(100, ["data".to_string()].into_iter().collect(), 4);
        let uri = "data:text/plain;base64,AAAAAAAAAAAA";
        assert!(gate.validate_uri(uri).is_err());
    }

    #[test]
    fn detects_xxe_pattern() {
        let gate = SecurityGate::default();
        let raw = b"BEGIN:VCALENDAR\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\">\n";
        assert_eq!(gate.check_xxe(raw), Err(SyntaxError::XxeAttempt));
    }

    #[test]
    fn depth_cap_allows_exactly_max() {
        let gate = SecurityGate::new(2, HashSet::new(), 1024);
        assert!(gate.check_depth(0).is_ok());
        assert!(gate.check_depth(1).is_ok());
        assert!(gate.check_depth(2).is_err());
    }

    #[test]
    fn sanitizes_control_bytes() {
        assert_eq!(sanitize_text("a\0b\x01c\td\ne"), "ab\\x01c\td\ne");
    }
}
