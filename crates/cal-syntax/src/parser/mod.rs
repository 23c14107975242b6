//! Recursive-descent parser with boundary-aware recovery.
//!
//! `parse` never fails: it always returns a document, possibly with partial
//! subtrees, alongside the accumulated error list. See [`core`] for the
//! recovery machinery and `grammar/` for the productions.

mod core;
mod error;
mod grammar;

#[cfg(test)]
mod tests;

pub use error::ParseError;

use crate::ast::CalDocument;
use crate::token::Token;

use self::core::Parser;

/// Parses a token stream into a document. All failures become entries in the
/// returned error list; no error escapes as a panic or a `Result`.
pub fn parse(tokens: Vec<Token>) -> (CalDocument, Vec<ParseError>) {
    let mut parser = Parser::new(tokens);
    let document = parser.parse_document();
    (document, parser.into_errors())
}
