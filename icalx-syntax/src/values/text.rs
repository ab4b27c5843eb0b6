//! TEXT: backslash-escaped text, possibly a comma-separated list.

/// Decodes one TEXT field: `\\` -> `\`, `\;` -> `;`, `\,` -> `,`,
/// `\n`/`\N` -> LF.
pub fn decode(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }

        match chars.peek() {
            Some('\\') => {
                output.push('\\');
                chars.next();
            }
            Some(';') => {
                output.push(';');
                chars.next();
            }
            Some(',') => {
                output.push(',');
                chars.next();
            }
            Some('n') | Some('N') => {
                output.push('\n');
                chars.next();
            }
            _ => output.push('\\'),
        }
    }

    output
}

/// Escaping order matters (§4.3): backslash first, then `;`/`,`, then
/// line breaks, to avoid double-escaping characters introduced by an
/// earlier pass.
pub fn encode(decoded: &str) -> String {
    let mut output = String::with_capacity(decoded.len());
    let mut chars = decoded.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => output.push_str("\\\\"),
            ';' => output.push_str("\\;"),
            ',' => output.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    output.push_str("\\n");
                }
            }
            '\n' => output.push_str("\\n"),
            other => output.push(other),
        }
    }

    output
}

/// Splits a raw TEXT value on unescaped commas (list properties such as
/// CATEGORIES), decoding each element.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => {
                items.push(decode(&current));
                current.clear();
            }
            other => current.push(other),
        }
    }

    items.push(decode(&current));
    items
}

pub fn format_list(items: &[String]) -> String {
    items.iter().map(|item| encode(item)).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_escapes() {
        assert_eq!(decode(r"Hello\, world\; text \\ and \nnewline"), "Hello, world; text \\ and \nnewline");
    }

    #[test]
    fn encode_order_avoids_double_escaping() {
        let decoded = "a\\b";
        assert_eq!(encode(decoded), "a\\\\b");
        assert_eq!(decode(&encode(decoded)), decoded);
    }

    #[test]
    fn encode_converts_crlf_but_drops_bare_cr() {
        assert_eq!(encode("a\r\nb"), "a\\nb");
        assert_eq!(encode("a\rb"), "ab");
    }

    #[test]
    fn splits_unescaped_commas() {
        assert_eq!(parse_list("APPOINTMENT,EDUCATION"), vec!["APPOINTMENT", "EDUCATION"]);
    }

    #[test]
    fn keeps_escaped_commas_within_one_item() {
        assert_eq!(parse_list(r"A\,B,C"), vec!["A,B", "C"]);
    }
}
