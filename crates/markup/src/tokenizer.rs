//! Core streaming tokenizer for lenient HTML.
//!
//! Malformed markup never fails: a `<` that does not open a tag is text, a
//! broken attribute list becomes residue on its tag, and an unterminated
//! script or style body consumes the rest of the buffer. Tokenization is a
//! pull-based single pass; one parsing step can discover several tokens
//! (leading text, the tag, an implied end tag, a whole script body), which
//! are held on a pending stack and emitted in order.

use std::collections::VecDeque;

use memchr::{memchr, memchr2};

use crate::matcher::{
    AttrNamePattern, BeginTagPattern, CommentPattern, DirectivePattern, EndTagPattern,
    PatternMatch, QuotedValuePattern, StatefulMatcher, TagClosePattern, UnquotedValuePattern,
    find_close_tag,
};
use crate::script::ScriptLexer;
use crate::style::StyleLexer;
use crate::token::{Attr, BeginTag, EndTag, Raw, Span, Token};

struct Parsed<'a> {
    token: Token<'a>,
    end: usize,
    trailing_end: Option<Token<'a>>,
}

pub struct Tokenizer<'a> {
    data: &'a str,
    pos: usize,
    /// Tokens discovered ahead of emission; popped LIFO.
    pending: Vec<Token<'a>>,
    /// Lookahead buffer filled by `peek`; drained FIFO before anything else.
    peeked: VecDeque<Token<'a>>,
    implied_end_tags: bool,
    comment: StatefulMatcher<CommentPattern>,
    directive: StatefulMatcher<DirectivePattern>,
    end_tag: StatefulMatcher<EndTagPattern>,
    begin_tag: StatefulMatcher<BeginTagPattern>,
    attr_name: StatefulMatcher<AttrNamePattern>,
    quoted_value: StatefulMatcher<QuotedValuePattern>,
    unquoted_value: StatefulMatcher<UnquotedValuePattern>,
    tag_close: StatefulMatcher<TagClosePattern>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(data: &'a str) -> Self {
        Self::with_options(data, false)
    }

    /// Like [`Tokenizer::new`], but a self-closing begin tag (`<br/>`) is
    /// followed by a synthesized, zero-width end tag.
    pub fn with_implied_end_tags(data: &'a str) -> Self {
        Self::with_options(data, true)
    }

    fn with_options(data: &'a str, implied_end_tags: bool) -> Self {
        Self {
            data,
            pos: 0,
            pending: Vec::with_capacity(5),
            peeked: VecDeque::new(),
            implied_end_tags,
            comment: StatefulMatcher::new(CommentPattern),
            directive: StatefulMatcher::new(DirectivePattern),
            end_tag: StatefulMatcher::new(EndTagPattern),
            begin_tag: StatefulMatcher::new(BeginTagPattern),
            attr_name: StatefulMatcher::new(AttrNamePattern),
            quoted_value: StatefulMatcher::new(QuotedValuePattern),
            unquoted_value: StatefulMatcher::new(UnquotedValuePattern),
            tag_close: StatefulMatcher::new(TagClosePattern),
        }
    }

    pub fn data(&self) -> &'a str {
        self.data
    }

    /// Offset of the next token to be yielded: head of the lookahead buffer,
    /// else top of the pending stack, else the raw scan position.
    pub fn position(&self) -> usize {
        if let Some(token) = self.peeked.front() {
            return token.span().start;
        }
        if let Some(token) = self.pending.last() {
            return token.span().start;
        }
        self.pos
    }

    /// The token `index` steps ahead, without consuming anything.
    pub fn peek(&mut self, index: usize) -> Option<&Token<'a>> {
        while self.peeked.len() <= index {
            match self.advance() {
                Some(token) => self.peeked.push_back(token),
                None => break,
            }
        }
        self.peeked.get(index)
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.peeked.pop_front() {
            return Some(token);
        }
        self.advance()
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.pop() {
            return Some(token);
        }

        let len = self.data.len();
        if self.pos >= len {
            return None;
        }

        let token_start = self.pos;
        loop {
            // Everything up to the next tag-looking thing is text.
            self.pos = match memchr(b'<', &self.data.as_bytes()[self.pos..]) {
                Some(i) => self.pos + i,
                None => len,
            };

            if self.pos >= len {
                return (token_start != self.pos).then(|| {
                    Token::Text(Raw::new(self.data, Span::new(token_start, self.pos)))
                });
            }

            let old_pos = self.pos;
            let Some(parsed) = self.parse_markup() else {
                // The `<` did not begin markup after all; it reads as text.
                self.pos = old_pos + 1;
                continue;
            };

            self.pos = parsed.end;
            if let Some(trailing) = parsed.trailing_end {
                self.pending.push(trailing);
            } else if let Token::Begin(tag) = &parsed.token {
                if !tag.is_complete() {
                    if tag.name_equals("script") {
                        self.consume_structured_body(true);
                    } else if tag.name_equals("style") {
                        self.consume_structured_body(false);
                    }
                }
            }
            self.pending.push(parsed.token);
            if old_pos != token_start {
                self.pending
                    .push(Token::Text(Raw::new(self.data, Span::new(token_start, old_pos))));
            }
            return self.pending.pop();
        }
    }

    /// Runs the matching sub-lexer over the element body, which ends at the
    /// first case-insensitive close tag or EOF. The close tag itself is left
    /// for normal tokenization; the sub-tokens land on the pending stack in
    /// emission order.
    fn consume_structured_body(&mut self, script: bool) {
        let name = if script { "script" } else { "style" };
        let end = match find_close_tag(self.data, self.pos, name) {
            Some((start, _)) => start,
            None => self.data.len(),
        };
        log::trace!(
            target: "markup.tokenizer",
            "{name} body [{}, {end})",
            self.pos
        );
        let base = self.pending.len();
        if script {
            self.pending.extend(ScriptLexer::new(self.data, self.pos, end));
        } else {
            self.pending.extend(StyleLexer::new(self.data, self.pos, end));
        }
        // The stack pops LIFO; reverse so the body comes out front to back.
        self.pending[base..].reverse();
        self.pos = end;
    }

    /// Tries to read markup at the current position. The comment pattern
    /// must be probed before the directive pattern, which would otherwise
    /// swallow `<!--`.
    fn parse_markup(&mut self) -> Option<Parsed<'a>> {
        let pos = self.pos;

        if let Some(m) = self.comment.probe(self.data, pos) {
            return Some(Parsed {
                token: Token::Comment(Raw::new(self.data, Span::new(m.start, m.end))),
                end: m.end,
                trailing_end: None,
            });
        }

        if let Some(m) = self.directive.probe(self.data, pos) {
            return Some(Parsed {
                token: Token::Directive(Raw::new(self.data, Span::new(m.start, m.end))),
                end: m.end,
                trailing_end: None,
            });
        }

        if let Some(m) = self.end_tag.probe(self.data, pos) {
            let raw = Raw::new(self.data, Span::new(m.start, m.end));
            return Some(Parsed {
                token: Token::End(EndTag::new(raw, m.capture, false)),
                end: m.end,
                trailing_end: None,
            });
        }

        if let Some(m) = self.begin_tag.probe(self.data, pos) {
            return Some(self.parse_begin_tag(m));
        }

        None
    }

    /// Attribute loop after `<name`. At each step: tag close, else attribute
    /// (optionally valued), else residue up to `<` (tag unterminated), `>`
    /// (consumed, excluded), or EOF.
    fn parse_begin_tag(&mut self, begin: PatternMatch<Span>) -> Parsed<'a> {
        let start = begin.start;
        let name = begin.capture;
        let mut tag_pos = begin.end;

        let mut attrs: Vec<Option<Attr<'a>>> = Vec::new();
        let mut residue = None;
        let mut complete = false;
        let mut trailing_end = None;

        loop {
            if let Some(close) = self.tag_close.probe(self.data, tag_pos) {
                tag_pos = close.end;
                if close.capture {
                    complete = true;
                    if self.implied_end_tags {
                        trailing_end = Some(Token::End(EndTag::new(
                            Raw::new(self.data, Span::new(tag_pos, tag_pos)),
                            name,
                            true,
                        )));
                    }
                }
                break;
            }

            if let Some(attr) = self.attr_name.probe(self.data, tag_pos) {
                tag_pos = attr.end;
                let value = if let Some(v) = self.quoted_value.probe(self.data, tag_pos) {
                    tag_pos = v.end;
                    Some(v.capture)
                } else if let Some(v) = self.unquoted_value.probe(self.data, tag_pos) {
                    tag_pos = v.end;
                    Some(v.capture)
                } else {
                    // Valueless attribute.
                    None
                };
                attrs.push(Some(Attr::new(self.data, attr.capture, value)));
                continue;
            }

            // Malformed tail. A `>` still terminates the tag; a `<` starts
            // over as fresh markup and leaves this tag unterminated.
            let residue_start = tag_pos;
            let residue_end;
            match memchr2(b'<', b'>', &self.data.as_bytes()[tag_pos..]) {
                None => {
                    residue_end = self.data.len();
                    tag_pos = self.data.len();
                }
                Some(i) if self.data.as_bytes()[tag_pos + i] == b'>' => {
                    residue_end = tag_pos + i;
                    tag_pos = tag_pos + i + 1;
                }
                Some(i) => {
                    residue_end = tag_pos + i;
                    tag_pos = tag_pos + i;
                }
            }
            if residue_start < residue_end {
                log::trace!(
                    target: "markup.tokenizer",
                    "residue [{residue_start}, {residue_end}) in tag at {start}"
                );
                residue = Some(Span::new(residue_start, residue_end));
            }
            break;
        }

        let raw = Raw::new(self.data, Span::new(start, tag_pos));
        Parsed {
            token: Token::Begin(BeginTag::new(raw, name, attrs, complete, residue)),
            end: tag_pos,
            trailing_end,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn kinds(html: &str) -> Vec<TokenKind> {
        Tokenizer::new(html).map(|t| t.kind()).collect()
    }

    fn round_trip(html: &str) -> String {
        Tokenizer::new(html).map(|t| t.to_text().into_owned()).collect()
    }

    #[test]
    fn plain_text_is_one_token() {
        let mut t = Tokenizer::new("hello world");
        let token = t.next_token().unwrap();
        assert_eq!(token.raw_text(), "hello world");
        assert!(t.next_token().is_none());
    }

    #[test]
    fn leading_text_is_emitted_before_the_tag() {
        let mut t = Tokenizer::new("ab<i>");
        assert_eq!(t.next_token().unwrap().raw_text(), "ab");
        assert_eq!(t.next_token().unwrap().raw_text(), "<i>");
    }

    #[test]
    fn comment_wins_over_directive() {
        assert_eq!(
            kinds("<!--x--><!DOCTYPE html>"),
            [TokenKind::Comment, TokenKind::Directive]
        );
    }

    #[test]
    fn comment_allows_whitespace_before_final_gt() {
        let mut t = Tokenizer::new("<!-- c -- \n >");
        let token = t.next_token().unwrap();
        assert_eq!(token.kind(), TokenKind::Comment);
        assert_eq!(token.raw_text(), "<!-- c -- \n >");
    }

    #[test]
    fn stray_lt_is_text() {
        let html = "1 < 2 and <3";
        assert_eq!(kinds(html), [TokenKind::Text]);
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn begin_tag_attributes_are_parsed_in_order() {
        let mut t = Tokenizer::new("<a href=\"x\" TARGET=_blank nowrap>");
        let token = t.next_token().unwrap();
        let tag = token.as_begin().unwrap();
        assert_eq!(tag.name(), "a");
        assert_eq!(tag.attr_value("href").as_deref(), Some("x"));
        assert_eq!(tag.attr_value("target").as_deref(), Some("_blank"));
        // nowrap has no value, so the value-bearing lookup misses...
        assert!(tag.attr("nowrap").is_none());
        // ...but the slot is there.
        assert!(tag.find_attribute("nowrap", true, 0).is_some());
    }

    #[test]
    fn tag_names_compare_case_insensitively() {
        let mut t = Tokenizer::new("<DIV>x</DIV>");
        let begin = t.next_token().unwrap();
        let tag = begin.as_begin().unwrap();
        assert!(tag.name_equals("div"));
        assert_eq!(tag.name(), "DIV");
        t.next_token();
        assert!(t.next_token().unwrap().as_end().unwrap().name_equals("div"));
    }

    #[test]
    fn removing_an_attribute_value_stops_it_being_value_bearing() {
        let mut t = Tokenizer::new("<a href=x nowrap>");
        let mut token = t.next_token().unwrap();
        let tag = token.as_begin_mut().unwrap();
        tag.attr_mut("href").unwrap().set_value(None);
        // The value-bearing lookup now misses, like for nowrap...
        assert!(tag.attr("href").is_none());
        assert!(tag.find_attribute("href", false, 0).is_none());
        // ...while the slot itself is still there.
        assert!(tag.find_attribute("href", true, 0).is_some());

        // The reverse: giving nowrap a value makes it value-bearing.
        tag.attr_mut("nowrap").unwrap().set_value(Some("nowrap".to_string()));
        assert_eq!(tag.attr_value("nowrap").as_deref(), Some("nowrap"));
    }

    #[test]
    fn malformed_attribute_tail_becomes_residue() {
        let html = "<a href=\"x\" ===><b>";
        let mut t = Tokenizer::new(html);
        let token = t.next_token().unwrap();
        let tag = token.as_begin().unwrap();
        assert_eq!(tag.residue(), Some("==="));
        assert!(!tag.is_unterminated());
        // The `>` was consumed; the next token is `<b>`.
        assert_eq!(t.next_token().unwrap().raw_text(), "<b>");
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn lt_in_attribute_position_leaves_tag_unterminated() {
        let html = "<a href=x <b>done";
        let mut t = Tokenizer::new(html);
        let token = t.next_token().unwrap();
        let tag = token.as_begin().unwrap();
        assert_eq!(tag.name(), "a");
        assert!(tag.is_unterminated());
        assert_eq!(t.next_token().unwrap().raw_text(), "<b>");
        assert_eq!(t.next_token().unwrap().raw_text(), "done");
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn unterminated_tag_at_eof_keeps_its_attributes() {
        let mut t = Tokenizer::new("<a href=\"x\"");
        let token = t.next_token().unwrap();
        let tag = token.as_begin().unwrap();
        assert!(tag.is_unterminated());
        assert_eq!(tag.attr_value("href").as_deref(), Some("x"));
        assert!(t.next_token().is_none());
    }

    #[test]
    fn implied_end_tags_follow_self_closing_tags() {
        let mut t = Tokenizer::with_implied_end_tags("<br/>x");
        let begin = t.next_token().unwrap();
        assert!(begin.as_begin().unwrap().is_complete());
        let end = t.next_token().unwrap();
        let end = end.as_end().unwrap();
        assert!(end.is_implied());
        assert_eq!(end.name(), "br");
        assert_eq!(end.to_text(), "");
        assert_eq!(t.next_token().unwrap().raw_text(), "x");
    }

    #[test]
    fn no_implied_end_tags_by_default() {
        assert_eq!(kinds("<br/>x"), [TokenKind::Begin, TokenKind::Text]);
    }

    #[test]
    fn script_body_is_sub_lexed() {
        let html = "<script>var s = 'a</b>';</script>done";
        let mut t = Tokenizer::new(html);
        assert_eq!(t.next_token().unwrap().kind(), TokenKind::Begin);
        assert_eq!(t.next_token().unwrap().kind(), TokenKind::ScriptText);
        let lit = t.next_token().unwrap();
        assert_eq!(lit.kind(), TokenKind::ScriptLiteral);
        assert_eq!(lit.as_literal().unwrap().literal_text(), "a</b>");
        assert_eq!(t.next_token().unwrap().kind(), TokenKind::ScriptText);
        let end = t.next_token().unwrap();
        assert_eq!(end.raw_text(), "</script>");
        assert_eq!(t.next_token().unwrap().raw_text(), "done");
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn unterminated_script_consumes_rest_of_buffer() {
        let html = "<script>alert(1); <p>not a tag";
        let tokens: Vec<_> = Tokenizer::new(html).collect();
        assert_eq!(tokens[0].kind(), TokenKind::Begin);
        assert!(tokens[1..].iter().all(Token::is_script));
        let rebuilt: String = tokens.iter().map(|t| t.to_text().into_owned()).collect();
        assert_eq!(rebuilt, html);
    }

    #[test]
    fn self_closing_script_does_not_sub_lex() {
        let kinds = kinds("<script/>var x;");
        assert_eq!(kinds, [TokenKind::Begin, TokenKind::Text]);
    }

    #[test]
    fn style_body_yields_url_tokens() {
        let html = "<style>b{background:url('x.png')}</style>";
        let tokens: Vec<_> = Tokenizer::new(html).collect();
        let url = tokens
            .iter()
            .find(|t| t.kind() == TokenKind::StyleUrl)
            .unwrap();
        assert_eq!(url.as_literal().unwrap().literal_text(), "x.png");
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn close_tag_match_is_case_insensitive_with_whitespace() {
        let html = "<style>a{}</STYLE >";
        let tokens: Vec<_> = Tokenizer::new(html).collect();
        assert_eq!(tokens.last().unwrap().raw_text(), "</STYLE >");
    }

    #[test]
    fn peek_does_not_consume() {
        let mut t = Tokenizer::new("a<b>c");
        assert_eq!(t.peek(1).unwrap().raw_text(), "<b>");
        assert_eq!(t.peek(0).unwrap().raw_text(), "a");
        assert!(t.peek(3).is_none());
        assert_eq!(t.next_token().unwrap().raw_text(), "a");
        assert_eq!(t.next_token().unwrap().raw_text(), "<b>");
        assert_eq!(t.next_token().unwrap().raw_text(), "c");
    }

    #[test]
    fn position_tracks_the_next_token() {
        let mut t = Tokenizer::new("ab<i>x");
        assert_eq!(t.position(), 0);
        t.next_token(); // "ab"
        assert_eq!(t.position(), 2);
        t.peek(1); // queue <i> and x
        assert_eq!(t.position(), 2);
        t.next_token(); // <i>
        assert_eq!(t.position(), 5);
    }

    #[test]
    fn round_trip_over_assorted_malformed_input() {
        let cases = [
            "<a href=\"x\" ===>",
            "<p <p <p>",
            "text<",
            "<!doctype html><html><body x=<p>y</p>",
            "<script>if (a<b) // '\n'q'</script>",
            "<style>@import 'a.css';url( b.png )</style>",
            "<em unterminated",
            "< notatag >",
            "<!-- unclosed comment",
            "<b x='1' y=2 z>t</b>",
        ];
        for html in cases {
            assert_eq!(round_trip(html), html, "round trip failed for {html:?}");
        }
    }

    #[test]
    fn utf8_text_spans_are_exact() {
        let html = "caf\u{00E9}<p>\u{2014}</p>";
        let mut t = Tokenizer::new(html);
        assert_eq!(t.next_token().unwrap().raw_text(), "caf\u{00E9}");
        assert_eq!(t.next_token().unwrap().raw_text(), "<p>");
        assert_eq!(t.next_token().unwrap().raw_text(), "\u{2014}");
    }
}
