//! INTEGER: an optionally signed decimal integer.

use crate::error::SyntaxError;

pub fn parse(raw: &str) -> Result<i64, SyntaxError> {
    raw.parse::<i64>().map_err(|error| SyntaxError::ValueFormat {
        kind: "INTEGER",
        raw: raw.to_string(),
        message: error.to_string(),
        line: 0,
    })
}
