//! Byte-level scanning helpers shared by the script and style sub-lexers.
//!
//! All positions are byte offsets into the full input buffer; callers pass an
//! explicit `end` so a sub-lexer can run over a window of the buffer without
//! slicing. Scanning is byte-based: every delimiter these helpers look for is
//! ASCII, so multi-byte UTF-8 sequences pass through untouched.

use memchr::{memchr, memchr2};

/// Outcome of scanning a quoted literal body.
pub(crate) struct QuotedLiteral {
    /// End of the literal body (exclusive; the closing quote is not part of
    /// it).
    pub literal_end: usize,
    /// Resume position: past the closing quote if one was found, at the bare
    /// newline or `end` otherwise.
    pub pos: usize,
}

/// Scans a quoted literal body starting just past the opening quote.
///
/// Backslash escapes the following character (which keeps escaped quotes and
/// line continuations inside the literal). A bare newline ends the literal
/// early and is left unconsumed. EOF ends the literal.
pub(crate) fn match_quoted_literal(data: &str, start: usize, end: usize, quote: u8) -> QuotedLiteral {
    debug_assert!(quote == b'"' || quote == b'\'');
    let bytes = data.as_bytes();
    let mut pos = start;

    while pos < end {
        match bytes[pos] {
            b'\\' => {
                // Skip the escaped byte. If it starts a multi-byte char the
                // remaining continuation bytes fall through the loop, since
                // they can never equal an ASCII delimiter.
                pos = (pos + 2).min(end);
            }
            c if c == quote => {
                return QuotedLiteral {
                    literal_end: pos,
                    pos: pos + 1,
                };
            }
            b'\n' | b'\r' => {
                return QuotedLiteral {
                    literal_end: pos,
                    pos,
                };
            }
            _ => pos += 1,
        }
    }
    QuotedLiteral {
        literal_end: end,
        pos: end,
    }
}

/// Scans to the end of the current line without consuming the line break.
pub(crate) fn match_single_line_comment(data: &str, start: usize, end: usize) -> usize {
    match memchr2(b'\n', b'\r', &data.as_bytes()[start..end]) {
        Some(i) => start + i,
        None => end,
    }
}

/// Scans past the closing `*/` of a block comment, or to `end`.
pub(crate) fn match_multi_line_comment(data: &str, start: usize, end: usize) -> usize {
    let bytes = data.as_bytes();
    let mut pos = start;
    while let Some(i) = memchr(b'*', &bytes[pos..end]) {
        let star = pos + i;
        if star + 1 < end && bytes[star + 1] == b'/' {
            return star + 2;
        }
        pos = star + 1;
    }
    end
}

/// Scans past the next occurrence of `target`, or to `end` if absent.
pub(crate) fn match_past_char(data: &str, start: usize, end: usize, target: u8) -> usize {
    match memchr(target, &data.as_bytes()[start..end]) {
        Some(i) => start + i + 1,
        None => end,
    }
}

pub(crate) fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Skips whitespace forward from `start`.
pub(crate) fn match_whitespace(data: &str, start: usize, end: usize) -> usize {
    let bytes = data.as_bytes();
    let mut pos = start;
    while pos < end && is_ws(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Shrinks `[start, end)` from both sides until neither edge is whitespace.
pub(crate) fn trim_whitespace(data: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = data.as_bytes();
    let lo = match_whitespace(data, start, end);
    let mut hi = end.max(lo);
    while hi > lo && is_ws(bytes[hi - 1]) {
        hi -= 1;
    }
    (lo, hi)
}

/// Case-sensitive prefix test at a position.
pub(crate) fn starts_with_at(data: &str, pos: usize, end: usize, needle: &str) -> bool {
    pos + needle.len() <= end && data.as_bytes()[pos..].starts_with(needle.as_bytes())
}

/// ASCII case-insensitive prefix test at a position.
pub(crate) fn starts_with_ignore_case_at(data: &str, pos: usize, end: usize, needle: &str) -> bool {
    pos + needle.len() <= end
        && data.as_bytes()[pos..pos + needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// Position of the next byte that could start a sub-lexer construct
/// (`'`, `"`, `/`, `<`, `-`, plus lexer-specific extras like `u`/`@`).
/// A hit is only a candidate; the caller still runs the longer-match check.
pub(crate) fn find_candidate(data: &str, start: usize, end: usize, extra: &[u8]) -> Option<usize> {
    data.as_bytes()[start..end]
        .iter()
        .position(|b| matches!(b, b'\'' | b'"' | b'/' | b'<' | b'-') || extra.contains(b))
        .map(|i| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_literal_stops_at_matching_quote() {
        let data = "'abc'def";
        let m = match_quoted_literal(data, 1, data.len(), b'\'');
        assert_eq!(&data[1..m.literal_end], "abc");
        assert_eq!(m.pos, 5);
    }

    #[test]
    fn quoted_literal_skips_escaped_quote() {
        let data = r"'a\'b'c";
        let m = match_quoted_literal(data, 1, data.len(), b'\'');
        assert_eq!(&data[1..m.literal_end], r"a\'b");
        assert_eq!(m.pos, 6);
    }

    #[test]
    fn quoted_literal_stops_before_bare_newline() {
        let data = "'abc\ndef'";
        let m = match_quoted_literal(data, 1, data.len(), b'\'');
        assert_eq!(&data[1..m.literal_end], "abc");
        // The newline is not consumed.
        assert_eq!(&data[m.pos..m.pos + 1], "\n");
    }

    #[test]
    fn quoted_literal_continues_over_escaped_newline() {
        let data = "'a\\\nb'";
        let m = match_quoted_literal(data, 1, data.len(), b'\'');
        assert_eq!(&data[1..m.literal_end], "a\\\nb");
        assert_eq!(m.pos, data.len());
    }

    #[test]
    fn quoted_literal_runs_to_eof_when_unterminated() {
        let data = "'abc";
        let m = match_quoted_literal(data, 1, data.len(), b'\'');
        assert_eq!(m.literal_end, data.len());
        assert_eq!(m.pos, data.len());
    }

    #[test]
    fn multi_line_comment_scans_past_close() {
        let data = "/* a * b */x";
        assert_eq!(match_multi_line_comment(data, 2, data.len()), 11);
        assert_eq!(match_multi_line_comment("/* open", 2, 7), 7);
    }

    #[test]
    fn single_line_comment_leaves_newline() {
        let data = "// hi\nnext";
        assert_eq!(match_single_line_comment(data, 2, data.len()), 5);
    }

    #[test]
    fn trim_whitespace_shrinks_both_ends() {
        let data = "(  x y  )";
        assert_eq!(trim_whitespace(data, 1, 8), (3, 6));
        assert_eq!(trim_whitespace("   ", 0, 3), (3, 3));
    }

    #[test]
    fn prefix_tests_respect_window_end() {
        let data = "url(x";
        assert!(starts_with_ignore_case_at(data, 0, data.len(), "URL("));
        assert!(!starts_with_ignore_case_at(data, 0, 3, "url("));
        assert!(starts_with_at(data, 3, data.len(), "("));
    }
}
