//! Markup-level pattern matchers and the memoizing wrapper around them.
//!
//! Each pattern implements a leftmost *search* (`find_from`), not an anchored
//! test. The tokenizer probes several candidate patterns at the same position
//! many times over a document; [`StatefulMatcher`] caches the last search so
//! a probe at a position before the cached hit is O(1), and once a pattern
//! has no further match in the buffer every later probe is O(1). This is what
//! keeps adversarial inputs (long runs of `<`, unclosed comments) linear.
//!
//! Memoization is a pure optimization: a probe returns exactly what a fresh
//! search from that position would.

use memchr::memchr;

use crate::token::Span;

pub(crate) fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b':')
}

/// End of the tag-name run starting at `start`.
fn name_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    i
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Width of the char starting at `i`; used to step over a rejected start
/// without splitting a multi-byte sequence.
fn char_width(data: &str, i: usize) -> usize {
    data[i..].chars().next().map_or(1, char::len_utf8)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PatternMatch<C> {
    pub start: usize,
    pub end: usize,
    pub capture: C,
}

pub(crate) trait Pattern {
    type Capture: Copy;

    /// Leftmost match starting at or after `pos`.
    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Self::Capture>>;
}

/// `<!--` ... `--` ws* `>`. Must be probed before [`DirectivePattern`]: every
/// comment opener is also a directive opener.
pub(crate) struct CommentPattern;

impl Pattern for CommentPattern {
    type Capture = ();

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<()>> {
        let bytes = data.as_bytes();
        let mut anchor = pos;
        while let Some(i) = memchr(b'<', &bytes[anchor..]) {
            let start = anchor + i;
            if bytes[start..].starts_with(b"<!--") {
                // Earliest `--` whose trailing whitespace ends in `>`.
                let mut k = start + 4;
                while let Some(j) = memchr(b'-', &bytes[k..]) {
                    let dash = k + j;
                    if bytes.get(dash + 1) == Some(&b'-') {
                        let close = skip_ws(bytes, dash + 2);
                        if bytes.get(close) == Some(&b'>') {
                            return Some(PatternMatch {
                                start,
                                end: close + 1,
                                capture: (),
                            });
                        }
                    }
                    k = dash + 1;
                }
                // No closing `--` anywhere after this opener, so no later
                // opener can close either.
                return None;
            }
            anchor = start + 1;
        }
        None
    }
}

/// `<!` (not followed by `--`) lazily through `>`.
pub(crate) struct DirectivePattern;

impl Pattern for DirectivePattern {
    type Capture = ();

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<()>> {
        let bytes = data.as_bytes();
        let mut anchor = pos;
        while let Some(i) = memchr(b'<', &bytes[anchor..]) {
            let start = anchor + i;
            if bytes.get(start + 1) == Some(&b'!') && !bytes[start + 2..].starts_with(b"--") {
                match memchr(b'>', &bytes[start + 2..]) {
                    Some(j) => {
                        return Some(PatternMatch {
                            start,
                            end: start + 2 + j + 1,
                            capture: (),
                        });
                    }
                    // No `>` left in the buffer at all.
                    None => return None,
                }
            }
            anchor = start + 1;
        }
        None
    }
}

/// `</name` ws* `>`; the capture is the name span.
pub(crate) struct EndTagPattern;

impl Pattern for EndTagPattern {
    type Capture = Span;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Span>> {
        let bytes = data.as_bytes();
        let mut anchor = pos;
        while let Some(i) = memchr(b'<', &bytes[anchor..]) {
            let start = anchor + i;
            if bytes.get(start + 1) == Some(&b'/')
                && bytes.get(start + 2).copied().is_some_and(is_name_start)
            {
                let name = Span::new(start + 2, name_end(bytes, start + 3));
                let close = skip_ws(bytes, name.end);
                if bytes.get(close) == Some(&b'>') {
                    return Some(PatternMatch {
                        start,
                        end: close + 1,
                        capture: name,
                    });
                }
            }
            anchor = start + 1;
        }
        None
    }
}

/// `<name`; the capture is the name span. The rest of the tag is consumed by
/// the attribute-level patterns.
pub(crate) struct BeginTagPattern;

impl Pattern for BeginTagPattern {
    type Capture = Span;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Span>> {
        let bytes = data.as_bytes();
        let mut anchor = pos;
        while let Some(i) = memchr(b'<', &bytes[anchor..]) {
            let start = anchor + i;
            if bytes.get(start + 1).copied().is_some_and(is_name_start) {
                let name = Span::new(start + 1, name_end(bytes, start + 2));
                return Some(PatternMatch {
                    start,
                    end: name.end,
                    capture: name,
                });
            }
            anchor = start + 1;
        }
        None
    }
}

/// ws* `name`; the capture is the name span.
pub(crate) struct AttrNamePattern;

impl Pattern for AttrNamePattern {
    type Capture = Span;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Span>> {
        let bytes = data.as_bytes();
        let mut start = pos;
        loop {
            let probe = skip_ws(bytes, start);
            if probe >= bytes.len() {
                return None;
            }
            if is_name_start(bytes[probe]) {
                let end = name_end(bytes, probe + 1);
                return Some(PatternMatch {
                    start,
                    end,
                    capture: Span::new(probe, end),
                });
            }
            start = probe + char_width(data, probe);
        }
    }
}

/// ws* `=` ws* quote ... quote; the capture is the unquoted value span. The
/// closing quote must match the opening one; there is no escaping.
pub(crate) struct QuotedValuePattern;

impl Pattern for QuotedValuePattern {
    type Capture = Span;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Span>> {
        let bytes = data.as_bytes();
        let mut start = pos;
        loop {
            let eq = skip_ws(bytes, start);
            if eq >= bytes.len() {
                return None;
            }
            if bytes[eq] != b'=' {
                start = eq + char_width(data, eq);
                continue;
            }
            let quote_pos = skip_ws(bytes, eq + 1);
            match bytes.get(quote_pos) {
                Some(&q @ (b'"' | b'\'')) => {
                    if let Some(j) = memchr(q, &bytes[quote_pos + 1..]) {
                        let close = quote_pos + 1 + j;
                        return Some(PatternMatch {
                            start,
                            end: close + 1,
                            capture: Span::new(quote_pos + 1, close),
                        });
                    }
                    // Unclosed quote; no start at or before `eq` can match.
                    start = eq + 1;
                }
                _ => start = eq + 1,
            }
        }
    }
}

/// ws* `=` ws* followed by at least one char that is neither whitespace nor
/// `>`; the capture is the value span.
pub(crate) struct UnquotedValuePattern;

impl Pattern for UnquotedValuePattern {
    type Capture = Span;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<Span>> {
        let bytes = data.as_bytes();
        let mut start = pos;
        loop {
            let eq = skip_ws(bytes, start);
            if eq >= bytes.len() {
                return None;
            }
            if bytes[eq] != b'=' {
                start = eq + char_width(data, eq);
                continue;
            }
            let value_start = skip_ws(bytes, eq + 1);
            if value_start < bytes.len() && bytes[value_start] != b'>' {
                let mut end = value_start;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                    end += 1;
                }
                return Some(PatternMatch {
                    start,
                    end,
                    capture: Span::new(value_start, end),
                });
            }
            start = eq + 1;
        }
    }
}

/// ws* optional `/` then `>`; the capture is true for the self-closing form.
pub(crate) struct TagClosePattern;

impl Pattern for TagClosePattern {
    type Capture = bool;

    fn find_from(&self, data: &str, pos: usize) -> Option<PatternMatch<bool>> {
        let bytes = data.as_bytes();
        let mut start = pos;
        loop {
            let probe = skip_ws(bytes, start);
            if probe >= bytes.len() {
                return None;
            }
            match bytes[probe] {
                b'>' => {
                    return Some(PatternMatch {
                        start,
                        end: probe + 1,
                        capture: false,
                    });
                }
                b'/' if bytes.get(probe + 1) == Some(&b'>') => {
                    return Some(PatternMatch {
                        start,
                        end: probe + 2,
                        capture: true,
                    });
                }
                _ => start = probe + char_width(data, probe),
            }
        }
    }
}

/// Close tag of a rawtext element: `</name` ws* `>`, name compared ASCII
/// case-insensitively. Used to bound script and style bodies; not memoized
/// because each body is scanned once.
pub(crate) fn find_close_tag(data: &str, pos: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = data.as_bytes();
    let mut anchor = pos;
    while let Some(i) = memchr(b'<', &bytes[anchor..]) {
        let start = anchor + i;
        if bytes.get(start + 1) == Some(&b'/')
            && bytes[start + 2..]
                .get(..name.len())
                .is_some_and(|cand| cand.eq_ignore_ascii_case(name.as_bytes()))
        {
            let after = start + 2 + name.len();
            // The name must end here, not be a prefix of a longer one.
            if !bytes.get(after).copied().is_some_and(is_name_byte) {
                let close = skip_ws(bytes, after);
                if bytes.get(close) == Some(&b'>') {
                    return Some((start, close + 1));
                }
            }
        }
        anchor = start + 1;
    }
    None
}

/// Memoizes the last search of a [`Pattern`] over a fixed buffer.
pub(crate) struct StatefulMatcher<P: Pattern> {
    pattern: P,
    /// Position the cached search started from; `usize::MAX` before any run.
    last_start: usize,
    /// `None` until the first search; `Some(None)` records an exhausted
    /// search (no match from `last_start` to EOF).
    last: Option<Option<PatternMatch<P::Capture>>>,
}

impl<P: Pattern> StatefulMatcher<P> {
    pub(crate) fn new(pattern: P) -> Self {
        Self {
            pattern,
            last_start: usize::MAX,
            last: None,
        }
    }

    /// Match of the pattern exactly at `pos`, if any.
    ///
    /// The cached search is re-executed only when it has never run, when it
    /// hit before `pos`, or when it started past `pos`.
    pub(crate) fn probe(&mut self, data: &str, pos: usize) -> Option<PatternMatch<P::Capture>> {
        let stale = match &self.last {
            None => true,
            Some(Some(m)) if m.start < pos => true,
            _ => self.last_start > pos,
        };
        if stale {
            self.last_start = pos;
            self.last = Some(self.pattern.find_from(data, pos));
        }
        match self.last {
            Some(Some(m)) if m.start == pos => Some(m),
            _ => None,
        }
    }
}
