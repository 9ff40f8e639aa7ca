use thiserror::Error;

use crate::token::Token;

/// A parsing error located at the offending token.
///
/// `line` and `col` are 1-based positions copied from the token. Running out of input is
/// reported against the synthetic `EOF` token, so locations are never `0:0`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{line}:{col}: {message}")]
pub struct ParserError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    /// Text of the offending token.
    pub found: String,
}

impl ParserError {
    /// The token cannot start or continue the construct being parsed.
    pub fn unexpected(token: &Token) -> Self {
        ParserError {
            message: format!("unexpected symbol '{}'", token.value),
            line: token.line,
            col: token.pos,
            found: token.value.clone(),
        }
    }

    /// A specific terminal was required here.
    pub fn expected(what: &str, token: &Token) -> Self {
        ParserError {
            message: format!("expected '{}', found '{}'", what, token.value),
            line: token.line,
            col: token.pos,
            found: token.value.clone(),
        }
    }
}
