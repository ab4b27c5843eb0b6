//! BINARY: base64-encoded octets.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::SyntaxError;

pub fn parse(raw: &str) -> Result<Vec<u8>, SyntaxError> {
    STANDARD.decode(raw.as_bytes()).map_err(|error| SyntaxError::ValueFormat {
        kind: "BINARY",
        raw: raw.to_string(),
        message: error.to_string(),
        line: 0,
    })
}

pub fn format(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
