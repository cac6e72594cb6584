//! Sub-lexer for the body of a `<style>` element.
//!
//! On top of the comment and quoted-literal handling shared with script
//! bodies, this lexer recognizes the two CSS constructs that carry URLs:
//! `url(...)` and `@import`. Both come back as literal tokens whose literal
//! sub-range is just the URL, so a rewrite pass can repoint references
//! without disturbing the surrounding syntax.

use memchr::memchr;

use crate::scan;
use crate::token::{Literal, LiteralFlavor, Raw, Span, Token};

pub(crate) struct StyleLexer<'a> {
    data: &'a str,
    pos: usize,
    end: usize,
}

/// Bytes (beyond the shared set) that may start a style construct.
const STYLE_EXTRAS: &[u8] = &[b'u', b'U', b'@'];

struct UrlMatch {
    literal: Span,
    quote: Option<char>,
    pos: usize,
}

impl<'a> StyleLexer<'a> {
    /// Lexes `data[pos..end]`; spans in yielded tokens are absolute.
    pub(crate) fn new(data: &'a str, pos: usize, end: usize) -> Self {
        debug_assert!(data.is_char_boundary(pos));
        debug_assert!(data.is_char_boundary(end));
        Self { data, pos, end }
    }

    fn quoted_literal(&mut self, start: usize, quote: char) -> Token<'a> {
        let m = scan::match_quoted_literal(self.data, start + 1, self.end, quote as u8);
        self.pos = m.pos;
        Token::StyleLiteral(Literal::new(
            Raw::new(self.data, Span::new(start, m.pos)),
            Span::new(start + 1, m.literal_end),
            Some(quote),
            LiteralFlavor::Style,
        ))
    }

    fn comment(&mut self, start: usize, to: usize) -> Token<'a> {
        self.pos = to;
        Token::StyleComment(Raw::new(self.data, Span::new(start, to)))
    }

    /// Scans the inside of `url(`, starting just past the open paren.
    /// Consumes through the closing paren when present.
    fn match_url(&self, mut pos: usize) -> UrlMatch {
        pos = scan::match_whitespace(self.data, pos, self.end);
        if pos >= self.end {
            return UrlMatch {
                literal: Span::new(pos, pos),
                quote: None,
                pos,
            };
        }
        match self.data.as_bytes()[pos] {
            q @ (b'\'' | b'"') => {
                let m = scan::match_quoted_literal(self.data, pos + 1, self.end, q);
                let after = scan::match_whitespace(self.data, m.pos, self.end);
                UrlMatch {
                    literal: Span::new(pos + 1, m.literal_end),
                    quote: Some(q as char),
                    pos: scan::match_past_char(self.data, after, self.end, b')'),
                }
            }
            _ => self.unquoted_literal(pos, b')'),
        }
    }

    /// Unquoted url/import payload: everything up to the terminator,
    /// whitespace-trimmed. When the terminator is missing the final char is
    /// excluded from the literal.
    fn unquoted_literal(&self, start: usize, terminator: u8) -> UrlMatch {
        let (lit_end, pos) = match memchr(terminator, &self.data.as_bytes()[start..self.end]) {
            Some(i) => (start + i, start + i + 1),
            None => (last_char_start(self.data, start, self.end), self.end),
        };
        let (lo, hi) = scan::trim_whitespace(self.data, start, lit_end.max(start));
        UrlMatch {
            literal: Span::new(lo, hi),
            quote: None,
            pos,
        }
    }

    /// Scans an `@import` payload, starting just past the keyword (or at its
    /// quote). Consumes through the terminating `;` when present.
    fn match_import(&self, mut pos: usize) -> UrlMatch {
        pos = scan::match_whitespace(self.data, pos, self.end);
        if pos >= self.end {
            return UrlMatch {
                literal: Span::new(pos, pos),
                quote: None,
                pos,
            };
        }
        if scan::starts_with_ignore_case_at(self.data, pos, self.end, "url(") {
            let url = self.match_url(pos + 4);
            return UrlMatch {
                pos: scan::match_past_char(self.data, url.pos, self.end, b';'),
                ..url
            };
        }
        match self.data.as_bytes()[pos] {
            q @ (b'\'' | b'"') => {
                let m = scan::match_quoted_literal(self.data, pos + 1, self.end, q);
                let after = scan::match_whitespace(self.data, m.pos, self.end);
                UrlMatch {
                    literal: Span::new(pos + 1, m.literal_end),
                    quote: Some(q as char),
                    pos: scan::match_past_char(self.data, after, self.end, b';'),
                }
            }
            _ => self.unquoted_literal(pos, b';'),
        }
    }

    /// True if a comment, literal, url, or import starts at `i`. Mirrors the
    /// stop set of the plain-run scan; the `@import` follow-char restriction
    /// is applied at dispatch, not here.
    fn is_construct(&self, i: usize) -> bool {
        match self.data.as_bytes()[i] {
            b'\'' | b'"' => true,
            b'/' => {
                scan::starts_with_at(self.data, i, self.end, "//")
                    || scan::starts_with_at(self.data, i, self.end, "/*")
            }
            b'<' => scan::starts_with_at(self.data, i, self.end, "<!--"),
            b'-' => scan::starts_with_at(self.data, i, self.end, "-->"),
            b'u' | b'U' => scan::starts_with_ignore_case_at(self.data, i, self.end, "url("),
            b'@' => scan::starts_with_ignore_case_at(self.data, i, self.end, "@import"),
            _ => false,
        }
    }

    fn plain_run(&mut self, start: usize, first_len: usize) -> Token<'a> {
        let mut probe = start + first_len;
        self.pos = loop {
            match scan::find_candidate(self.data, probe, self.end, STYLE_EXTRAS) {
                None => break self.end,
                Some(i) if self.is_construct(i) => break i,
                Some(i) => probe = i + 1,
            }
        };
        Token::StyleText(Raw::new(self.data, Span::new(start, self.pos)))
    }
}

/// Start offset of the last char in `[start, end)`, or `start` if empty.
fn last_char_start(data: &str, start: usize, end: usize) -> usize {
    data[start..end]
        .char_indices()
        .next_back()
        .map_or(start, |(i, _)| start + i)
}

impl<'a> Iterator for StyleLexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.end {
            return None;
        }
        let start = self.pos;
        let c = self.data[start..].chars().next()?;

        match c {
            '"' | '\'' => Some(self.quoted_literal(start, c)),
            '/' if scan::starts_with_at(self.data, start, self.end, "//") => {
                let to = scan::match_single_line_comment(self.data, start + 2, self.end);
                Some(self.comment(start, to))
            }
            '/' if scan::starts_with_at(self.data, start, self.end, "/*") => {
                let to = scan::match_multi_line_comment(self.data, start + 2, self.end);
                Some(self.comment(start, to))
            }
            '<' if scan::starts_with_at(self.data, start, self.end, "<!--") => {
                let to = scan::match_single_line_comment(self.data, start + 4, self.end);
                Some(self.comment(start, to))
            }
            '-' if scan::starts_with_at(self.data, start, self.end, "-->") => {
                let to = scan::match_single_line_comment(self.data, start + 3, self.end);
                Some(self.comment(start, to))
            }
            'u' | 'U' if scan::starts_with_ignore_case_at(self.data, start, self.end, "url(") => {
                let url = self.match_url(start + 4);
                self.pos = url.pos;
                Some(Token::StyleUrl(Literal::new(
                    Raw::new(self.data, Span::new(start, url.pos)),
                    url.literal,
                    url.quote,
                    LiteralFlavor::Url,
                )))
            }
            '@' if scan::starts_with_ignore_case_at(self.data, start, self.end, "@import") => {
                // Only treat as @import when followed by whitespace or a
                // quote; otherwise it reads as an unrelated at-rule.
                let after = start + "@import".len();
                let follow = (after < self.end).then(|| self.data.as_bytes()[after]);
                let scan_from = match follow {
                    Some(b) if scan::is_ws(b) => Some(after + 1),
                    Some(b'\'' | b'"') => Some(after),
                    _ => None,
                };
                match scan_from {
                    Some(from) => {
                        let import = self.match_import(from);
                        self.pos = import.pos;
                        Some(Token::StyleImport(Literal::new(
                            Raw::new(self.data, Span::new(start, import.pos)),
                            import.literal,
                            import.quote,
                            LiteralFlavor::Url,
                        )))
                    }
                    None => Some(self.plain_run(start, 1)),
                }
            }
            _ => Some(self.plain_run(start, c.len_utf8())),
        }
    }
}
