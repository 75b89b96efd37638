use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A line/column pair supplied by the caller (usually the script compiler)
/// and attached to errors at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Expected {expected}, got: {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Expected embedded function to have {allowed} parameters, received: {received}")]
    CallbackArity { allowed: String, received: usize },

    #[error("Expected Array of type String, Boolean, or Number, got: Array of type {kind}")]
    OrderKind { kind: String },

    #[error("{0}")]
    Domain(String),

    #[error("No suitable plugin found for mime type: {kind}/{subtype}")]
    CodecNotFound { kind: String, subtype: String },

    #[error("{0}")]
    Codec(String),

    #[error("Could not parse media type: {0}")]
    InvalidMediaType(String),

    #[error("{0}")]
    HeaderParse(String),

    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("{message}")]
    Eval { message: String },

    #[error("{message} at line {line} column {column}")]
    Located {
        message: String,
        line: usize,
        column: usize,
    },
}

impl Error {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn eval(message: impl Into<String>) -> Error {
        Error::Eval {
            message: message.into(),
        }
    }

    /// Wrap this error with the enclosing source position. Already-located
    /// errors are returned untouched so the innermost position wins.
    pub fn at(self, position: Position) -> Error {
        match self {
            located @ Error::Located { .. } => located,
            other => Error::Located {
                message: other.to_string(),
                line: position.line,
                column: position.column,
            },
        }
    }
}
