//! Sub-lexer for the body of a `<script>` element.
//!
//! Splits the body into plain runs, comments, and quoted string literals so a
//! rewrite pass can retarget string contents without touching code. Comment
//! syntax covers `//`, `/* ... */`, and the legacy SGML hiding tokens `<!--`
//! and `-->`, each of which comments out the rest of its line.
//!
//! Everything the lexer does not recognize is a plain run; concatenating the
//! raw text of all yielded tokens reproduces the window exactly.

use crate::scan;
use crate::token::{Literal, LiteralFlavor, Raw, Span, Token};

pub(crate) struct ScriptLexer<'a> {
    data: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> ScriptLexer<'a> {
    /// Lexes `data[pos..end]`; spans in yielded tokens are absolute.
    pub(crate) fn new(data: &'a str, pos: usize, end: usize) -> Self {
        debug_assert!(data.is_char_boundary(pos));
        debug_assert!(data.is_char_boundary(end));
        Self { data, pos, end }
    }

    fn quoted_literal(&mut self, start: usize, quote: char) -> Token<'a> {
        let m = scan::match_quoted_literal(self.data, start + 1, self.end, quote as u8);
        self.pos = m.pos;
        Token::ScriptLiteral(Literal::new(
            Raw::new(self.data, Span::new(start, m.pos)),
            Span::new(start + 1, m.literal_end),
            Some(quote),
            LiteralFlavor::Script,
        ))
    }

    fn comment(&mut self, start: usize, to: usize) -> Token<'a> {
        self.pos = to;
        Token::ScriptComment(Raw::new(self.data, Span::new(start, to)))
    }

    /// True if a comment or literal starts at `i`. Mirrors the stop set of
    /// the plain-run scan.
    fn is_construct(&self, i: usize) -> bool {
        match self.data.as_bytes()[i] {
            b'\'' | b'"' => true,
            b'/' => {
                scan::starts_with_at(self.data, i, self.end, "//")
                    || scan::starts_with_at(self.data, i, self.end, "/*")
            }
            b'<' => scan::starts_with_at(self.data, i, self.end, "<!--"),
            b'-' => scan::starts_with_at(self.data, i, self.end, "-->"),
            _ => false,
        }
    }

    /// Consumes a plain run: the char at `start` plus everything up to the
    /// next construct.
    fn plain_run(&mut self, start: usize, first_len: usize) -> Token<'a> {
        let mut probe = start + first_len;
        self.pos = loop {
            match scan::find_candidate(self.data, probe, self.end, &[]) {
                None => break self.end,
                Some(i) if self.is_construct(i) => break i,
                Some(i) => probe = i + 1,
            }
        };
        Token::ScriptText(Raw::new(self.data, Span::new(start, self.pos)))
    }
}

impl<'a> Iterator for ScriptLexer<'a> {
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
            _ => Some(self.plain_run(start, c.len_utf8())),
        }
    }
}
