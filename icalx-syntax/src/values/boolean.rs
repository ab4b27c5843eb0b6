//! BOOLEAN: `TRUE` / `FALSE`.

use crate::error::SyntaxError;

pub fn parse(raw: &str) -> Result<bool, SyntaxError> {
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(SyntaxError::ValueFormat {
            kind: "BOOLEAN",
            raw: raw.to_string(),
            message: "expected TRUE or FALSE".to_string(),
            line: 0,
        }),
    }
}

pub fn format(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}
