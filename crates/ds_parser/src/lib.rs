//! Python parser for desync.
//!
//! Turns source text into a [`ds_ast::Module`] whose nodes carry line spans
//! and whose comments are kept as statements:
//!
//! - `ds_lexer` produces the token stream (comments included),
//! - a recursive-descent parser builds statements (`stmt`) and
//!   expressions (`expr`) following Python's grammar and precedence.
//!
//! Any failure is reported as a [`ParseError`] naming the file, line and
//! column.

mod cursor;
mod error;
mod expr;
pub mod parse;
mod stmt;

pub use error::ParseError;
pub use parse::parse_module;
