//! Token model for the markup tokenizer.
//!
//! Every token borrows the input buffer and carries a half-open byte span.
//! Raw text is a zero-copy slice; `to_text()` allocates only when an
//! override (a rewritten literal or attribute) forces reconstruction.
//!
//! Round-trip contract: concatenating `to_text()` of every token from a full
//! pass, in emission order and with no overrides set, reproduces the input
//! buffer byte for byte.

use std::borrow::Cow;

use crate::entities::{UnescapeMode, escape_entities, unescape_entities};
use crate::literal::{URL_LITERAL_ESCAPES, css_escape, css_unescape, js_escape, js_unescape};

/// Byte span into the input buffer.
///
/// Invariant: spans lie on UTF-8 boundaries of the buffer that produced them
/// and are only meaningful against that buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A raw slice of the input buffer: the shared payload of every token.
#[derive(Clone, Copy, Debug)]
pub struct Raw<'a> {
    data: &'a str,
    span: Span,
}

impl<'a> Raw<'a> {
    pub(crate) fn new(data: &'a str, span: Span) -> Self {
        debug_assert!(data.is_char_boundary(span.start));
        debug_assert!(data.is_char_boundary(span.end));
        Self { data, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> &'a str {
        &self.data[self.span.start..self.span.end]
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.data[span.start..span.end]
    }
}

/// Discriminates token shapes for kind-based predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Comment,
    Directive,
    Begin,
    End,
    ScriptText,
    ScriptComment,
    ScriptLiteral,
    StyleText,
    StyleComment,
    StyleLiteral,
    StyleUrl,
    StyleImport,
}

/// One lexical unit of the input: markup, text, or an embedded script/style
/// sub-token.
#[derive(Clone, Debug)]
pub enum Token<'a> {
    Text(Raw<'a>),
    Comment(Raw<'a>),
    Directive(Raw<'a>),
    Begin(BeginTag<'a>),
    End(EndTag<'a>),
    ScriptText(Raw<'a>),
    ScriptComment(Raw<'a>),
    ScriptLiteral(Literal<'a>),
    StyleText(Raw<'a>),
    StyleComment(Raw<'a>),
    StyleLiteral(Literal<'a>),
    StyleUrl(Literal<'a>),
    StyleImport(Literal<'a>),
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Text(_) => TokenKind::Text,
            Token::Comment(_) => TokenKind::Comment,
            Token::Directive(_) => TokenKind::Directive,
            Token::Begin(_) => TokenKind::Begin,
            Token::End(_) => TokenKind::End,
            Token::ScriptText(_) => TokenKind::ScriptText,
            Token::ScriptComment(_) => TokenKind::ScriptComment,
            Token::ScriptLiteral(_) => TokenKind::ScriptLiteral,
            Token::StyleText(_) => TokenKind::StyleText,
            Token::StyleComment(_) => TokenKind::StyleComment,
            Token::StyleLiteral(_) => TokenKind::StyleLiteral,
            Token::StyleUrl(_) => TokenKind::StyleUrl,
            Token::StyleImport(_) => TokenKind::StyleImport,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Token::Text(raw)
            | Token::Comment(raw)
            | Token::Directive(raw)
            | Token::ScriptText(raw)
            | Token::ScriptComment(raw)
            | Token::StyleText(raw)
            | Token::StyleComment(raw) => raw.span(),
            Token::Begin(tag) => tag.raw.span(),
            Token::End(tag) => tag.raw.span(),
            Token::ScriptLiteral(lit)
            | Token::StyleLiteral(lit)
            | Token::StyleUrl(lit)
            | Token::StyleImport(lit) => lit.raw.span(),
        }
    }

    /// The token's bytes exactly as they appear in the buffer. Implied end
    /// tags have an empty raw slice.
    pub fn raw_text(&self) -> &'a str {
        match self {
            Token::Text(raw)
            | Token::Comment(raw)
            | Token::Directive(raw)
            | Token::ScriptText(raw)
            | Token::ScriptComment(raw)
            | Token::StyleText(raw)
            | Token::StyleComment(raw) => raw.text(),
            Token::Begin(tag) => tag.raw.text(),
            Token::End(tag) => tag.raw.text(),
            Token::ScriptLiteral(lit)
            | Token::StyleLiteral(lit)
            | Token::StyleUrl(lit)
            | Token::StyleImport(lit) => lit.raw.text(),
        }
    }

    /// Serialized form: the raw slice unless an override requires
    /// reconstruction.
    pub fn to_text(&self) -> Cow<'a, str> {
        match self {
            Token::Begin(tag) => tag.to_text(),
            Token::End(tag) => tag.to_text(),
            Token::ScriptLiteral(lit)
            | Token::StyleLiteral(lit)
            | Token::StyleUrl(lit)
            | Token::StyleImport(lit) => lit.to_text(),
            _ => Cow::Borrowed(self.raw_text()),
        }
    }

    pub fn as_begin(&self) -> Option<&BeginTag<'a>> {
        match self {
            Token::Begin(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_begin_mut(&mut self) -> Option<&mut BeginTag<'a>> {
        match self {
            Token::Begin(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_end(&self) -> Option<&EndTag<'a>> {
        match self {
            Token::End(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal<'a>> {
        match self {
            Token::ScriptLiteral(lit)
            | Token::StyleLiteral(lit)
            | Token::StyleUrl(lit)
            | Token::StyleImport(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_literal_mut(&mut self) -> Option<&mut Literal<'a>> {
        match self {
            Token::ScriptLiteral(lit)
            | Token::StyleLiteral(lit)
            | Token::StyleUrl(lit)
            | Token::StyleImport(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::ScriptText | TokenKind::ScriptComment | TokenKind::ScriptLiteral
        )
    }

    pub fn is_style(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::StyleText
                | TokenKind::StyleComment
                | TokenKind::StyleLiteral
                | TokenKind::StyleUrl
                | TokenKind::StyleImport
        )
    }
}

/// Escape flavor for a literal-bearing token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LiteralFlavor {
    /// Quoted literal in a script body (backslash escapes, JS style).
    Script,
    /// Quoted literal in a style body (CSS hex escapes).
    Style,
    /// `url(...)` / `@import` literal; rewritten unquoted forms gain quotes.
    Url,
}

/// A quoted (or unquoted, for `url(...)`) literal inside a script or style
/// body. The literal sub-span sits inside the token's raw span; everything
/// outside it (quotes, `url(` prefix, terminators) is preserved verbatim on
/// reserialization.
#[derive(Clone, Debug)]
pub struct Literal<'a> {
    raw: Raw<'a>,
    literal: Span,
    quote: Option<char>,
    flavor: LiteralFlavor,
    override_value: Option<String>,
}

impl<'a> Literal<'a> {
    pub(crate) fn new(
        raw: Raw<'a>,
        literal: Span,
        quote: Option<char>,
        flavor: LiteralFlavor,
    ) -> Self {
        debug_assert!(raw.span().start <= literal.start && literal.end <= raw.span().end);
        Self {
            raw,
            literal,
            quote,
            flavor,
            override_value: None,
        }
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }

    pub fn literal_span(&self) -> Span {
        self.literal
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn raw_text(&self) -> &'a str {
        self.raw.text()
    }

    /// The logical (unescaped) literal value, or the override if one was set.
    pub fn literal_text(&self) -> Cow<'a, str> {
        if let Some(value) = &self.override_value {
            return Cow::Owned(value.clone());
        }
        let raw = self.raw.slice(self.literal);
        match self.flavor {
            LiteralFlavor::Script => {
                if raw.contains('\\') {
                    Cow::Owned(js_unescape(raw))
                } else {
                    Cow::Borrowed(raw)
                }
            }
            LiteralFlavor::Style | LiteralFlavor::Url => {
                if raw.contains('\\') {
                    Cow::Owned(css_unescape(raw))
                } else {
                    Cow::Borrowed(raw)
                }
            }
        }
    }

    /// Replaces the logical literal value. Serialization keeps the bytes
    /// around the literal sub-range untouched.
    pub fn set_literal_text(&mut self, value: impl Into<String>) {
        self.override_value = Some(value.into());
    }

    pub fn is_modified(&self) -> bool {
        self.override_value.is_some()
    }

    pub fn to_text(&self) -> Cow<'a, str> {
        let Some(value) = &self.override_value else {
            return Cow::Borrowed(self.raw.text());
        };
        let span = self.raw.span();
        let prefix = self.raw.slice(Span::new(span.start, self.literal.start));
        let suffix = self.raw.slice(Span::new(self.literal.end, span.end));

        let mut out = String::with_capacity(span.len() + value.len());
        out.push_str(prefix);
        match self.flavor {
            LiteralFlavor::Script => out.push_str(&js_escape(value, self.quote)),
            LiteralFlavor::Style => out.push_str(&css_escape(value, self.quote, &[])),
            LiteralFlavor::Url => {
                // An unquoted url/import literal gains quotes when rewritten,
                // so values with delimiters stay parseable.
                if self.quote.is_none() {
                    out.push('"');
                    out.push_str(&css_escape(value, None, URL_LITERAL_ESCAPES));
                    out.push('"');
                } else {
                    out.push_str(&css_escape(value, self.quote, &[]));
                }
            }
        }
        out.push_str(suffix);
        Cow::Owned(out)
    }
}

/// A single attribute of a begin tag. The value may be absent (`nowrap`).
#[derive(Clone, Debug)]
pub struct Attr<'a> {
    data: &'a str,
    name: Span,
    value: Span,
    has_value: bool,
    override_value: Option<String>,
    modified: bool,
}

impl<'a> Attr<'a> {
    pub(crate) fn new(data: &'a str, name: Span, value: Option<Span>) -> Self {
        Self {
            data,
            name,
            value: value.unwrap_or(Span::new(name.end, name.end)),
            has_value: value.is_some(),
            override_value: None,
            modified: false,
        }
    }

    /// Attribute name, case preserved.
    pub fn name(&self) -> &'a str {
        &self.data[self.name.start..self.name.end]
    }

    pub fn name_equals(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// Raw value bytes, before entity unescaping.
    pub fn raw_value(&self) -> Option<&'a str> {
        self.has_value
            .then(|| &self.data[self.value.start..self.value.end])
    }

    /// Effective value: the override when modified, otherwise the raw value
    /// with entities unescaped in `Attribute` mode.
    pub fn value(&self) -> Option<Cow<'a, str>> {
        if self.modified {
            return self.override_value.as_ref().map(|v| Cow::Owned(v.clone()));
        }
        let raw = self.raw_value()?;
        if raw.contains('&') {
            Some(Cow::Owned(unescape_entities(raw, UnescapeMode::Attribute)))
        } else {
            Some(Cow::Borrowed(raw))
        }
    }

    /// Overrides the value. `None` removes the value while keeping the
    /// attribute (it serializes as a bare name).
    pub fn set_value(&mut self, value: Option<String>) {
        self.modified = true;
        self.override_value = value;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// True when [`Attr::value`] would return `Some`: an override counts
    /// only while it holds a value, and a removed value stops counting.
    fn has_effective_value(&self) -> bool {
        if self.modified {
            self.override_value.is_some()
        } else {
            self.has_value
        }
    }

    /// Serialized form used when the owning tag is rebuilt. Overridden
    /// values are entity-escaped and double-quoted; untouched values keep
    /// their raw bytes.
    pub fn to_text(&self) -> String {
        let value = if self.modified {
            self.override_value.as_deref().map(escape_entities)
        } else {
            self.raw_value().map(str::to_string)
        };
        match value {
            Some(v) => format!("{}=\"{}\"", self.name(), v),
            None => self.name().to_string(),
        }
    }
}

impl PartialEq for Attr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name_equals(other.name()) && self.value() == other.value()
    }
}

/// A begin tag, e.g. `<a href="#">`, `<option selected>`, `<br/>`.
#[derive(Clone, Debug)]
pub struct BeginTag<'a> {
    raw: Raw<'a>,
    name: Span,
    /// Encounter order; `None` marks a removed slot.
    attrs: Vec<Option<Attr<'a>>>,
    complete: bool,
    modified: bool,
    residue: Option<Span>,
}

impl<'a> BeginTag<'a> {
    pub(crate) fn new(
        raw: Raw<'a>,
        name: Span,
        attrs: Vec<Option<Attr<'a>>>,
        complete: bool,
        residue: Option<Span>,
    ) -> Self {
        Self {
            raw,
            name,
            attrs,
            complete,
            modified: false,
            residue,
        }
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }

    /// Tag name, case preserved. Use [`BeginTag::name_equals`] for
    /// case-insensitive comparison.
    pub fn name(&self) -> &'a str {
        self.raw.slice(self.name)
    }

    pub fn name_equals(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// True for self-closing tags (`<br/>`).
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn set_complete(&mut self, complete: bool) {
        if self.complete != complete {
            self.modified = true;
            self.complete = complete;
        }
    }

    /// True if the tag never reached its closing `>`, e.g. the `a` tag in
    /// `<a href="foo" <br>`.
    pub fn is_unterminated(&self) -> bool {
        !self.raw.text().ends_with('>')
    }

    pub fn has_residue(&self) -> bool {
        self.residue.is_some()
    }

    /// Leftover bytes between the last well-formed attribute and the tag
    /// end, preserved verbatim.
    pub fn residue(&self) -> Option<&'a str> {
        self.residue.map(|span| self.raw.slice(span))
    }

    pub fn attributes(&self) -> &[Option<Attr<'a>>] {
        &self.attrs
    }

    pub fn attributes_mut(&mut self) -> &mut [Option<Attr<'a>>] {
        &mut self.attrs
    }

    /// First value-bearing attribute with the given name.
    pub fn attr(&self, name: &str) -> Option<&Attr<'a>> {
        self.find_attribute(name, false, 0).map(|(_, attr)| attr)
    }

    /// First attribute with the given name at or after `start`;
    /// `allow_no_value` also accepts valueless attributes. Returns the slot
    /// index alongside the attribute.
    pub fn find_attribute(
        &self,
        name: &str,
        allow_no_value: bool,
        start: usize,
    ) -> Option<(usize, &Attr<'a>)> {
        self.attrs
            .iter()
            .enumerate()
            .skip(start)
            .filter_map(|(i, slot)| slot.as_ref().map(|attr| (i, attr)))
            .find(|(_, attr)| {
                attr.name_equals(name) && (allow_no_value || attr.has_effective_value())
            })
    }

    pub fn attr_mut(&mut self, name: &str) -> Option<&mut Attr<'a>> {
        self.attrs
            .iter_mut()
            .filter_map(|slot| slot.as_mut())
            .find(|attr| attr.name_equals(name))
    }

    /// Effective value of the first value-bearing attribute with this name.
    pub fn attr_value(&self, name: &str) -> Option<Cow<'a, str>> {
        self.attr(name).and_then(Attr::value)
    }

    /// Removes the first attribute with this name. The slot stays in the
    /// list (as `None`) so later indices remain stable.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        for slot in &mut self.attrs {
            if slot.as_ref().is_some_and(|attr| attr.name_equals(name)) {
                *slot = None;
                return true;
            }
        }
        false
    }

    fn needs_rebuild(&self) -> bool {
        self.modified
            || self
                .attrs
                .iter()
                .any(|slot| slot.as_ref().is_none_or(Attr::is_modified))
    }

    pub fn to_text(&self) -> Cow<'a, str> {
        if !self.needs_rebuild() {
            return Cow::Borrowed(self.raw.text());
        }

        let mut out = String::with_capacity(self.raw.span().len());
        out.push('<');
        out.push_str(self.name());
        let mut live = self.attrs.iter().filter_map(|slot| slot.as_ref());
        if let Some(first) = live.next() {
            out.push(' ');
            out.push_str(&first.to_text());
            for attr in live {
                out.push(' ');
                out.push_str(&attr.to_text());
            }
        }
        if let Some(residue) = self.residue() {
            out.push_str(residue);
        }
        if self.complete {
            out.push_str(" /");
        }
        out.push('>');
        Cow::Owned(out)
    }
}

/// An end tag (`</a>`), possibly implied by a self-closing begin tag.
#[derive(Clone, Debug)]
pub struct EndTag<'a> {
    raw: Raw<'a>,
    name: Span,
    implied: bool,
}

impl<'a> EndTag<'a> {
    pub(crate) fn new(raw: Raw<'a>, name: Span, implied: bool) -> Self {
        Self { raw, name, implied }
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }

    pub fn name(&self) -> &'a str {
        self.raw.slice(self.name)
    }

    pub fn name_equals(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// True when synthesized from a self-closing begin tag rather than
    /// present in the source.
    pub fn is_implied(&self) -> bool {
        self.implied
    }

    pub fn to_text(&self) -> Cow<'a, str> {
        if self.implied {
            Cow::Borrowed("")
        } else {
            Cow::Borrowed(self.raw.text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw<'a>(data: &'a str, start: usize, end: usize) -> Raw<'a> {
        Raw::new(data, Span::new(start, end))
    }

    #[test]
    fn literal_round_trips_without_override() {
        let data = "'x.png'";
        let lit = Literal::new(
            raw(data, 0, 7),
            Span::new(1, 6),
            Some('\''),
            LiteralFlavor::Script,
        );
        assert_eq!(lit.literal_text(), "x.png");
        assert_eq!(lit.to_text(), "'x.png'");
    }

    #[test]
    fn literal_override_rebuilds_prefix_and_suffix() {
        let data = "url('x.png')";
        let mut lit = Literal::new(
            raw(data, 0, 12),
            Span::new(5, 10),
            Some('\''),
            LiteralFlavor::Url,
        );
        lit.set_literal_text("y.gif");
        assert_eq!(lit.to_text(), "url('y.gif')");
    }

    #[test]
    fn unquoted_url_override_gains_quotes() {
        let data = "url(x.png)";
        let mut lit = Literal::new(raw(data, 0, 10), Span::new(4, 9), None, LiteralFlavor::Url);
        lit.set_literal_text("a b.png");
        assert_eq!(lit.to_text(), "url(\"a\\ b.png\")");
    }

    #[test]
    fn script_literal_unescapes_lazily() {
        let data = r"'a\nb'";
        let lit = Literal::new(
            raw(data, 0, 6),
            Span::new(1, 5),
            Some('\''),
            LiteralFlavor::Script,
        );
        assert_eq!(lit.literal_text(), "a\nb");
    }

    #[test]
    fn attr_value_unescapes_entities_in_attribute_mode() {
        let data = "href=\"a&amp;b&pounda\"";
        let attr = Attr::new(data, Span::new(0, 4), Some(Span::new(6, 20)));
        assert_eq!(attr.name(), "href");
        // &amp; decodes, the unterminated &pounda does not (Attribute mode).
        assert_eq!(attr.value().as_deref(), Some("a&b&pounda"));
    }

    #[test]
    fn attr_override_serializes_escaped_and_quoted() {
        let data = "x=1";
        let mut attr = Attr::new(data, Span::new(0, 1), Some(Span::new(2, 3)));
        attr.set_value(Some("a&b".to_string()));
        assert_eq!(attr.to_text(), "x=\"a&amp;b\"");
        assert_eq!(attr.value().as_deref(), Some("a&b"));
    }

    #[test]
    fn attr_removed_value_serializes_as_bare_name() {
        let data = "x=1";
        let mut attr = Attr::new(data, Span::new(0, 1), Some(Span::new(2, 3)));
        attr.set_value(None);
        assert_eq!(attr.to_text(), "x");
        assert_eq!(attr.value(), None);
    }

    #[test]
    fn attr_equality_is_name_case_insensitive_and_value_sensitive() {
        let a = Attr::new("ID=x", Span::new(0, 2), Some(Span::new(3, 4)));
        let b = Attr::new("id=x", Span::new(0, 2), Some(Span::new(3, 4)));
        let c = Attr::new("id=y", Span::new(0, 2), Some(Span::new(3, 4)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn implied_end_tag_serializes_empty() {
        let data = "<br/>";
        let tag = EndTag::new(raw(data, 5, 5), Span::new(1, 3), true);
        assert_eq!(tag.name(), "br");
        assert!(tag.is_implied());
        assert_eq!(tag.to_text(), "");
    }
}
