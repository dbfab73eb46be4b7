use thiserror::Error;

/// A syntax error raised while compiling an expression.
///
/// `line` and `column` are 1-based and point at the character (or token)
/// where the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Errors raised while evaluating a compiled expression.
///
/// Soft errors describe data that did not match the shape the expression
/// expects; `Expression::search` turns them into `null`. Hard errors indicate
/// caller misuse (undecodable payloads, impossible arities) and are returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{0}")]
    Type(String),

    #[error("slice step cannot be 0")]
    InvalidSlice,

    #[error("expression references are only valid as function arguments")]
    ExpressionRef,

    #[error("{0}")]
    Arity(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("decompression failed: {0}")]
    Decompress(String),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type(message.into())
    }

    /// Hard errors escape `search`; everything else degrades to `null`.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            EvalError::Arity(_)
                | EvalError::UnknownFunction(_)
                | EvalError::InvalidBase64(_)
                | EvalError::InvalidJson(_)
                | EvalError::Decompress(_)
        )
    }
}

/// Error returned by the one-shot [`crate::search`] helper.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
