//! Backslash-escape codec for quoted literals embedded in script and style
//! bodies.
//!
//! Contract:
//! - `js_unescape`/`css_unescape` fail open: an escape they cannot decode is
//!   emitted verbatim rather than dropped or replaced.
//! - Backslash-newline line continuations (`\` followed by `\n`, `\r`, or
//!   `\r\n`) unescape to the empty string in both flavors.
//! - The escape functions produce output whose unescape is the original
//!   value; they do not promise byte-identical round trips with arbitrary
//!   source escapes (`\x41` unescapes to `A` and re-escapes to `A`).

/// Decodes JavaScript string-literal escapes.
pub fn js_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&(_, next)) = chars.peek() else {
            // Trailing lone backslash.
            out.push('\\');
            break;
        };
        match next {
            'n' => {
                out.push('\n');
                chars.next();
            }
            't' => {
                out.push('\t');
                chars.next();
            }
            'r' => {
                out.push('\r');
                chars.next();
            }
            'b' => {
                out.push('\u{0008}');
                chars.next();
            }
            'f' => {
                out.push('\u{000C}');
                chars.next();
            }
            'v' => {
                out.push('\u{000B}');
                chars.next();
            }
            '0' => {
                out.push('\0');
                chars.next();
            }
            '\n' | '\r' => {
                // Line continuation erases the break; \r\n counts as one.
                chars.next();
                if next == '\r' {
                    if let Some(&(_, '\n')) = chars.peek() {
                        chars.next();
                    }
                }
            }
            'x' | 'u' => {
                let digits = if next == 'x' { 2 } else { 4 };
                match decode_fixed_hex(text, i + 2, digits) {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..=digits {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                        chars.next();
                    }
                }
            }
            other => {
                out.push(other);
                chars.next();
            }
        }
    }
    out
}

/// Reads exactly `digits` hex digits starting at byte `start`.
fn decode_fixed_hex(text: &str, start: usize, digits: usize) -> Option<char> {
    let hex = text.get(start..start + digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Escapes `value` for inclusion in a JavaScript string literal delimited by
/// `quote` (`None` leaves both quote characters unescaped).
pub fn js_escape(value: &str, quote: Option<char>) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if Some(c) == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Decodes CSS string-literal escapes: `\` + up to six hex digits with an
/// optional single trailing whitespace, a line continuation, or a literal
/// next character.
pub fn css_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        if bytes[i] != b'\\' {
            // Copy one full character.
            let c = match text[i..].chars().next() {
                Some(c) => c,
                None => break,
            };
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        if i + 1 >= len {
            out.push('\\');
            break;
        }
        let next = bytes[i + 1];
        if next.is_ascii_hexdigit() {
            let mut j = i + 1;
            while j < len && j - i <= 6 && bytes[j].is_ascii_hexdigit() {
                j += 1;
            }
            debug_assert!(text.is_char_boundary(j));
            let value = u32::from_str_radix(&text[i + 1..j], 16).ok();
            match value.and_then(char::from_u32) {
                Some(c) => {
                    out.push(c);
                    // A single whitespace terminates the escape and is eaten.
                    if j < len && matches!(bytes[j], b' ' | b'\t' | b'\r' | b'\n') {
                        if bytes[j] == b'\r' && bytes.get(j + 1) == Some(&b'\n') {
                            j += 1;
                        }
                        j += 1;
                    }
                    i = j;
                }
                None => {
                    out.push_str(&text[i..j]);
                    i = j;
                }
            }
        } else if next == b'\n' || next == b'\r' {
            // Line continuation.
            i += 2;
            if next == b'\r' && bytes.get(i) == Some(&b'\n') {
                i += 1;
            }
        } else {
            let c = match text[i + 1..].chars().next() {
                Some(c) => c,
                None => break,
            };
            out.push(c);
            i += 1 + c.len_utf8();
        }
    }
    out
}

/// Escapes `value` for inclusion in a CSS string literal delimited by
/// `quote`. `extra` lists additional characters that must be escaped (used by
/// unquoted `url(...)` forms, where parens and whitespace are delimiters).
pub fn css_escape(value: &str, quote: Option<char>, extra: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => {
                // CSS has no single-char newline escape; use the hex form
                // with its terminating space.
                out.push_str(&format!("\\{:X} ", c as u32));
            }
            c if Some(c) == quote || extra.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Characters escaped inside rewritten unquoted `url(...)` / `@import`
/// literals, in addition to the quote delimiters added around them.
pub(crate) const URL_LITERAL_ESCAPES: &[char] = &['(', ')', ' ', '\t', '"', '\'', ','];
