//! Lenient HTML markup tokenization.
//!
//! This crate takes markup as it exists in the wild (mismatched tags, stray
//! `<`, unterminated attributes, half-closed comments) and splits it into a
//! flat token stream without ever failing: malformed input is data, not an
//! error. On top of the tokenizer sit embedded sub-lexers for script and
//! style bodies, an entity/escape codec, a seek/match/collect extraction
//! layer, and a replace-in-place rewrite pass.
//!
//! The core contract is byte-exact reversibility: concatenating
//! [`Token::to_text`] over a full pass reproduces the input unless the caller
//! has overridden a literal or attribute value.

pub mod entities;
pub mod extract;
pub mod literal;
pub mod rewrite;
pub mod text;
pub mod token;
pub mod tokenizer;

mod matcher;
mod scan;
mod script;
mod style;

pub use entities::{UnescapeMode, escape_entities, unescape_entities};
pub use extract::{Criterion, CriterionError, Extractor, TokenPredicate};
pub use rewrite::rewrite_html;
pub use text::to_plain_text;
pub use token::{Attr, BeginTag, EndTag, Literal, Span, Token, TokenKind};
pub use tokenizer::Tokenizer;
