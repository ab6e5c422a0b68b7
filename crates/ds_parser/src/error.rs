use ds_lexer::LexError;
use thiserror::Error;

/// Syntax error in the input. `col` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{filename}:{line}:{col}: {message}")]
pub struct ParseError {
    pub filename: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl ParseError {
    pub(crate) fn from_lex(filename: &str, err: LexError) -> Self {
        Self {
            filename: filename.to_string(),
            line: err.line,
            col: err.col,
            message: err.kind.to_string(),
        }
    }
}
