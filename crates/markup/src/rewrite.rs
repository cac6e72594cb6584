//! Replace-in-place document transform.
//!
//! Tokenizes a document and re-emits it token by token, letting a callback
//! substitute or mutate tokens along the way. With a callback that touches
//! nothing, the output is the input, byte for byte.

use crate::token::Token;
use crate::tokenizer::Tokenizer;

/// Rewrites `html` through `f`. For each token, a `Some` return replaces the
/// token's text outright; on `None` the token serializes itself, including
/// any overrides `f` set through the mutable reference.
pub fn rewrite_html<F>(html: &str, mut f: F) -> String
where
    F: FnMut(&mut Token<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(html.len());
    let mut tokenizer = Tokenizer::new(html);
    while let Some(mut token) = tokenizer.next_token() {
        match f(&mut token) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(&token.to_text()),
        }
    }
    out
}
