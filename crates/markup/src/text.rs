//! Markup to plain text, driven by the tokenizer rather than the raw bytes,
//! so script/style bodies and malformed tags are handled the same way the
//! rest of the crate handles them.
//!
//! Block-level structure degrades to line breaks: paragraphs, headings, and
//! lists produce blank-line separation, `<br>`/`<li>`/`<div>` a single line
//! break. Everything inside `<head>` is dropped, as are comments, directives,
//! and script/style bodies. Entities unescape in `Default` mode; whitespace
//! collapses; the result carries no leading or trailing whitespace.

use crate::entities::{UnescapeMode, unescape_entities};
use crate::token::Token;
use crate::tokenizer::Tokenizer;

const NO_BREAK: u8 = 0;
const LINE_BREAK: u8 = 1;
const PARAGRAPH_BREAK: u8 = 2;

fn break_level(name: &str) -> u8 {
    let bytes = name.as_bytes();
    match bytes {
        [b'p' | b'P'] => PARAGRAPH_BREAK,
        [b'u' | b'U', b'l' | b'L'] | [b'o' | b'O', b'l' | b'L'] => PARAGRAPH_BREAK,
        [b'h' | b'H', d] if (b'1'..=b'7').contains(d) => PARAGRAPH_BREAK,
        [b'b' | b'B', b'r' | b'R'] => LINE_BREAK,
        [b'l' | b'L', b'i' | b'I'] => LINE_BREAK,
        [b'd' | b'D', b'i' | b'I', b'v' | b'V'] => LINE_BREAK,
        _ => NO_BREAK,
    }
}

/// Flattens markup into readable plain text.
pub fn to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut pending_break = NO_BREAK;
    let mut pending_space = false;

    let mut tokenizer = Tokenizer::new(html);
    while let Some(token) = tokenizer.next_token() {
        match &token {
            Token::Begin(tag) if tag.name_equals("head") && !tag.is_complete() => {
                while let Some(inner) = tokenizer.next_token() {
                    if inner.as_end().is_some_and(|end| end.name_equals("head")) {
                        break;
                    }
                }
            }
            Token::Begin(tag) => pending_break = pending_break.max(break_level(tag.name())),
            Token::End(tag) => pending_break = pending_break.max(break_level(tag.name())),
            Token::Text(raw) => {
                let text = unescape_entities(raw.text(), UnescapeMode::Default);
                for c in text.chars() {
                    if c.is_whitespace() {
                        pending_space = true;
                        continue;
                    }
                    if c == '\0' {
                        // Plain-text mail reply headers end in a NUL; treat
                        // it as a paragraph boundary.
                        pending_break = PARAGRAPH_BREAK;
                        continue;
                    }
                    if pending_break != NO_BREAK {
                        if !out.is_empty() {
                            out.push('\n');
                            if pending_break == PARAGRAPH_BREAK {
                                out.push('\n');
                            }
                        }
                        pending_break = NO_BREAK;
                        pending_space = false;
                    } else if pending_space {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        pending_space = false;
                    }
                    out.push(c);
                }
            }
            // Comments, directives, and script/style bodies contribute
            // nothing to the visible text.
            _ => {}
        }
    }
    out
}
