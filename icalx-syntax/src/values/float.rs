//! FLOAT: an optionally signed decimal with a fractional part.

use crate::error::SyntaxError;

pub fn parse(raw: &str) -> Result<f64, SyntaxError> {
    raw.parse::<f64>().map_err(|error| SyntaxError::ValueFormat {
        kind: "FLOAT",
        raw: raw.to_string(),
        message: error.to_string(),
        line: 0,
    })
}

pub fn format(value: f64) -> String {
    let mut formatted = format!("{value}");
    if !formatted.contains('.') {
        formatted.push_str(".0");
    }
    formatted
}
