//! plox-lex - Lexical analysis for Plox source text.
//!
//! Transforms a stream of characters into a stream of tokens. Whitespace
//! and `//` comments separate tokens and are discarded; newlines advance
//! the line counter carried on every token's span.
//!
//! Lexical errors (unknown character, unterminated string, malformed
//! number) are reported through the shared [`Handler`](plox_util::Handler)
//! and scanning continues past the offending character, so one pass can
//! surface several errors. Callers gate on `handler.has_errors()` before
//! running later stages.

pub mod cursor;
mod edge_cases;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::{tokenize, Lexer};
pub use token::{keyword_from_ident, Token, TokenWithSpan};
