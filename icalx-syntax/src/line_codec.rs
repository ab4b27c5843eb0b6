//! Content-line folding and unfolding (spec §4.1). New relative to the
//! teacher, which never receives folded `.ics` text directly (it stores
//! one property per redis field); grounded in RFC 5545 §3.1 and the
//! general unfold/fold shape used by `calico`/`calcard` in the example
//! pack's tokenizer layer.

use crate::error::SyntaxError;

const FOLD_LIMIT: usize = 75;

/// Number of UTF-8 bytes in `s`. A thin name for `str::len`, kept because
/// the spec calls this operation out by name (§4.1) and call sites read
/// better as `octet_length(x)` than `x.len()`.
pub fn octet_length(s: &str) -> usize {
    s.len()
}

/// Normalizes CR, LF, and CRLF line breaks to CRLF, then joins any line
/// that begins with a single SPACE or TAB onto the previous line (the
/// fold continuation), removing the break and the leading whitespace
/// octet. Returns one logical line per `Vec` entry, with no trailing
/// CRLF on any of them.
pub fn unfold(input: &str) -> Result<Vec<String>, SyntaxError> {
    let normalized = normalize_line_endings(input);

    let mut logical_lines: Vec<String> = Vec::new();
    let mut line_no: u32 = 0;

    for raw_line in normalized.split('\n') {
        line_no += 1;

        let is_continuation = raw_line.starts_with(' ') || raw_line.starts_with('\t');

        if is_continuation {
            match logical_lines.last_mut() {
                Some(previous) => previous.push_str(&raw_line[1..]),
                None => {
                    return Err(SyntaxError::MalformedFolding {
                        line: line_no,
                        line_text: raw_line.to_string(),
                    })
                }
            }
        } else {
            logical_lines.push(raw_line.to_string());
        }
    }

    // A single trailing empty line from the final line-break is not a
    // logical line of content.
    if logical_lines.last().is_some_and(String::is_empty) {
        logical_lines.pop();
    }

    Ok(logical_lines)
}

fn normalize_line_endings(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                output.push('\n');
            }
            '\n' => output.push('\n'),
            other => output.push(other),
        }
    }

    output
}

/// Folds a single logical line into CRLF+SPACE continuations so that
/// every physical line is at most 75 octets, never splitting a UTF-8
/// multi-byte sequence across a fold boundary.
pub fn fold(logical_line: &str) -> String {
    let mut output = String::with_capacity(logical_line.len() + logical_line.len() / FOLD_LIMIT * 3);
    let mut physical_octets: usize = 0;

    for ch in logical_line.chars() {
        let char_len = ch.len_utf8();

        if physical_octets + char_len > FOLD_LIMIT {
            output.push_str("\r\n ");
            physical_octets = 1; // the continuation SPACE is the first octet
        }

        output.push(ch);
        physical_octets += char_len;
    }

    output
}

/// Folds every logical line and joins them with CRLF, appending a final
/// CRLF (the wire format always terminates the last line, §6).
pub fn fold_all<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> String {
    let mut output = String::new();

    for line in lines {
        output.push_str(&fold(line));
        output.push_str("\r\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfold_joins_space_continuation() {
        let input = "SUMMARY:Hello\r\n World\r\n";
        assert_eq!(unfold(input).unwrap(), vec!["SUMMARY:Hello World".to_string()]);
    }

    #[test]
    fn unfold_joins_tab_continuation() {
        let input = "SUMMARY:Hello\r\n\tWorld\r\n";
        assert_eq!(unfold(input).unwrap(), vec!["SUMMARY:HelloWorld".to_string()]);
    }

    #[test]
    fn unfold_tolerates_bare_lf_and_cr() {
        assert_eq!(unfold("A:1\nB:2\n").unwrap(), vec!["A:1".to_string(), "B:2".to_string()]);
        assert_eq!(unfold("A:1\rB:2\r").unwrap(), vec!["A:1".to_string(), "B:2".to_string()]);
    }

    #[test]
    fn unfold_rejects_leading_continuation() {
        let err = unfold(" leading\r\n").unwrap_err();
        assert!(matches!(err, SyntaxError::MalformedFolding { .. }));
    }

    #[test]
    fn fold_keeps_lines_within_75_octets() {
        let long_value = "x".repeat(200);
        let line = format!("SUMMARY:{long_value}");
        let folded = fold(&line);

        for physical in folded.split("\r\n") {
            assert!(octet_length(physical) <= FOLD_LIMIT);
        }
    }

    #[test]
    fn fold_never_splits_multibyte_utf8() {
        // 🎄 is 4 bytes; force a fold boundary right at it.
        let prefix = "x".repeat(FOLD_LIMIT - 2);
        let line = format!("{prefix}🎄🎄🎄🎄🎄🎄🎄🎄");
        let folded = fold(&line);

        for physical in folded.split("\r\n") {
            assert!(std::str::from_utf8(physical.as_bytes()).is_ok());
        }
    }

    #[test]
    fn round_trips_fold_unfold() {
        let logical = "DESCRIPTION:".to_string() + &"a".repeat(300);
        let wire = fold_all(vec![logical.as_str()]);
        let back = unfold(&wire).unwrap();
        assert_eq!(back, vec![logical]);
    }
}
