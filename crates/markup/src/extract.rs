//! Query layer over the tokenizer: predicates, the criterion mini-language,
//! and the seek/match/collect [`Extractor`].
//!
//! A criterion string is compiled by tokenizing it with the same tokenizer it
//! will later be matched against, so its grammar is by construction a subset
//! of the markup grammar: `<a href>` compiles to "begin tag named `a` with an
//! `href` attribute", `</div>` to "end tag named `div`". Unlike tokenization,
//! criterion compilation fails loudly, since a malformed pattern is a
//! programming error rather than data.

use std::error::Error;
use std::fmt;

use crate::text::to_plain_text;
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;

pub trait TokenPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool;
}

/// Attribute a [`BeginTagPredicate`] insists on: present by name, and equal
/// to `value` when one is given.
#[derive(Clone, Debug)]
pub struct RequiredAttr {
    name: String,
    value: Option<String>,
}

impl RequiredAttr {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Begin tag by (optional) name plus required attributes.
#[derive(Clone, Debug, Default)]
pub struct BeginTagPredicate {
    name: Option<String>,
    attrs: Vec<RequiredAttr>,
}

impl BeginTagPredicate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attrs: Vec::new(),
        }
    }

    /// Matches any begin tag carrying the required attributes.
    pub fn any_name(attrs: Vec<RequiredAttr>) -> Self {
        Self { name: None, attrs }
    }

    pub fn require(mut self, attr: RequiredAttr) -> Self {
        self.attrs.push(attr);
        self
    }
}

impl TokenPredicate for BeginTagPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        let Some(tag) = token.as_begin() else {
            return false;
        };
        if let Some(name) = &self.name {
            if !tag.name_equals(name) {
                return false;
            }
        }
        self.attrs.iter().all(|required| {
            match tag.find_attribute(&required.name, true, 0) {
                Some((_, attr)) => match &required.value {
                    Some(value) => attr.value().as_deref() == Some(value.as_str()),
                    None => true,
                },
                None => false,
            }
        })
    }
}

#[derive(Clone, Debug)]
pub struct EndTagPredicate {
    name: String,
}

impl EndTagPredicate {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenPredicate for EndTagPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        token.as_end().is_some_and(|tag| tag.name_equals(&self.name))
    }
}

/// Text token whose raw bytes equal the pattern exactly.
#[derive(Clone, Debug)]
pub struct TextPredicate {
    text: String,
}

impl TextPredicate {
    pub fn exact(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TokenPredicate for TextPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        token.kind() == TokenKind::Text && token.raw_text() == self.text
    }
}

/// Comment token whose raw bytes equal the pattern exactly.
#[derive(Clone, Debug)]
pub struct CommentPredicate {
    text: String,
}

impl CommentPredicate {
    pub fn exact(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TokenPredicate for CommentPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        token.kind() == TokenKind::Comment && token.raw_text() == self.text
    }
}

#[derive(Clone, Copy, Debug)]
pub struct KindPredicate(pub TokenKind);

impl TokenPredicate for KindPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        token.kind() == self.0
    }
}

pub struct AndPredicate(pub Vec<Box<dyn TokenPredicate>>);

impl TokenPredicate for AndPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        self.0.iter().all(|p| p.is_match(token))
    }
}

pub struct OrPredicate(pub Vec<Box<dyn TokenPredicate>>);

impl TokenPredicate for OrPredicate {
    fn is_match(&self, token: &Token<'_>) -> bool {
        self.0.iter().any(|p| p.is_match(token))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CriterionError {
    /// The criterion produced no token at all.
    Empty,
    /// The criterion produced more than one token; chain seeks instead.
    TooManyTokens,
    /// A begin-tag criterion was unterminated or carried residue.
    Malformed,
    /// The single token was not a begin tag, end tag, text, or comment.
    Unsupported,
}

impl fmt::Display for CriterionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionError::Empty => write!(f, "criterion is empty"),
            CriterionError::TooManyTokens => {
                write!(f, "criterion contains more than one token")
            }
            CriterionError::Malformed => write!(f, "criterion tag is malformed"),
            CriterionError::Unsupported => {
                write!(f, "criterion token type is not matchable")
            }
        }
    }
}

impl Error for CriterionError {}

/// A compiled criterion string.
pub struct Criterion(Box<dyn TokenPredicate>);

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Criterion").finish()
    }
}

impl Criterion {
    /// Compiles `criterion` by tokenizing it and inspecting the single token
    /// produced.
    pub fn parse(criterion: &str) -> Result<Self, CriterionError> {
        let mut tokenizer = Tokenizer::new(criterion);
        let token = tokenizer.next_token().ok_or(CriterionError::Empty)?;
        if tokenizer.next_token().is_some() {
            return Err(CriterionError::TooManyTokens);
        }

        match &token {
            Token::Begin(tag) => {
                if tag.has_residue() || tag.is_unterminated() {
                    return Err(CriterionError::Malformed);
                }
                let attrs = tag
                    .attributes()
                    .iter()
                    .flatten()
                    .map(|attr| RequiredAttr {
                        name: attr.name().to_string(),
                        value: attr.value().map(|v| v.into_owned()),
                    })
                    .collect();
                Ok(Self(Box::new(BeginTagPredicate {
                    name: Some(tag.name().to_string()),
                    attrs,
                })))
            }
            Token::End(tag) => Ok(Self(Box::new(EndTagPredicate::named(tag.name())))),
            Token::Text(_) => Ok(Self(Box::new(TextPredicate::exact(token.raw_text())))),
            Token::Comment(_) => Ok(Self(Box::new(CommentPredicate::exact(token.raw_text())))),
            _ => Err(CriterionError::Unsupported),
        }
    }
}

impl TokenPredicate for Criterion {
    fn is_match(&self, token: &Token<'_>) -> bool {
        self.0.is_match(token)
    }
}

/// Forward-only search and extraction over one document.
///
/// Calls chain: a failed seek leaves the stream at EOF, so
/// `ex.seek(&a).success() || ex.reset().seek(&b).success()` reads naturally.
pub struct Extractor<'a> {
    html: &'a str,
    tokenizer: Tokenizer<'a>,
    last_match: Option<Token<'a>>,
}

impl<'a> Extractor<'a> {
    pub fn new(html: &'a str) -> Self {
        Self {
            html,
            tokenizer: Tokenizer::new(html),
            last_match: None,
        }
    }

    /// The underlying tokenizer, positioned just past the last match.
    pub fn tokenizer(&mut self) -> &mut Tokenizer<'a> {
        &mut self.tokenizer
    }

    /// Whether the last seek/match succeeded.
    pub fn success(&self) -> bool {
        self.last_match.is_some()
    }

    /// The last matched token, if the last seek/match succeeded.
    pub fn token(&self) -> Option<&Token<'a>> {
        self.last_match.as_ref()
    }

    /// Repositions to the beginning of the document.
    pub fn reset(&mut self) -> &mut Self {
        self.last_match = None;
        self.tokenizer = Tokenizer::new(self.html);
        self
    }

    /// Advances until `predicate` matches, discarding everything before.
    pub fn seek(&mut self, predicate: &dyn TokenPredicate) -> &mut Self {
        self.seek_within(predicate, None)
    }

    /// Like [`Extractor::seek`], but gives up (without matching) as soon as
    /// `stop` matches first.
    pub fn seek_within(
        &mut self,
        predicate: &dyn TokenPredicate,
        stop: Option<&dyn TokenPredicate>,
    ) -> &mut Self {
        self.last_match = None;
        while let Some(token) = self.tokenizer.next_token() {
            if predicate.is_match(&token) {
                self.last_match = Some(token);
                break;
            }
            if stop.is_some_and(|s| s.is_match(&token)) {
                break;
            }
        }
        self
    }

    /// Tests only the very next token; with `ignore_whitespace`, pure
    /// whitespace text tokens are skipped first.
    pub fn match_next(
        &mut self,
        predicate: &dyn TokenPredicate,
        ignore_whitespace: bool,
    ) -> &mut Self {
        self.last_match = None;
        if let Some(token) = self.next_inner(ignore_whitespace) {
            if predicate.is_match(&token) {
                self.last_match = Some(token);
            }
        }
        self
    }

    pub fn next(&mut self) -> Option<Token<'a>> {
        self.next_inner(false)
    }

    pub fn next_skip_whitespace(&mut self) -> Option<Token<'a>> {
        self.next_inner(true)
    }

    fn next_inner(&mut self, ignore_whitespace: bool) -> Option<Token<'a>> {
        loop {
            let token = self.tokenizer.next_token()?;
            if !(ignore_whitespace && is_whitespace_text(&token)) {
                return Some(token);
            }
        }
    }

    /// Raw markup up to the balanced end tag: nested same-named begin tags
    /// deepen, end tags shallow, and collection stops just before depth
    /// reaches zero. The end tag itself is consumed but not collected.
    pub fn collect_html_until(&mut self, tag_name: &str) -> String {
        let mut depth = 1u32;
        let mut out = String::new();
        while let Some(token) = self.tokenizer.next_token() {
            match &token {
                Token::Begin(tag) if tag.name_equals(tag_name) => depth += 1,
                Token::End(tag) if tag.name_equals(tag_name) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            out.push_str(token.raw_text());
        }
        out
    }

    /// Balanced collection, normalized to plain text.
    pub fn collect_text_until(&mut self, tag_name: &str) -> String {
        to_plain_text(&self.collect_html_until(tag_name))
    }

    /// Raw markup up to (not including) the first token matching the
    /// predicate. No tag balancing.
    pub fn collect_html_until_predicate(&mut self, predicate: &dyn TokenPredicate) -> String {
        let mut out = String::new();
        while let Some(token) = self.tokenizer.next_token() {
            if predicate.is_match(&token) {
                break;
            }
            out.push_str(token.raw_text());
        }
        out
    }

    /// Unbalanced collection, normalized to plain text.
    pub fn collect_text_until_predicate(&mut self, predicate: &dyn TokenPredicate) -> String {
        to_plain_text(&self.collect_html_until_predicate(predicate))
    }
}

fn is_whitespace_text(token: &Token<'_>) -> bool {
    token.kind() == TokenKind::Text && token.raw_text().chars().all(char::is_whitespace)
}
