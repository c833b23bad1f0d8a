use metapath_schema::{QName, SchemaError};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MetapathError {
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Index {index} out of range for size {size}")]
    IndexError { index: i64, size: usize },

    #[error("Cardinality error: expected {expected}, got {actual} items")]
    CardinalityError { expected: &'static str, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot cast {from_type} to {to_type}: {value}")]
    InvalidCast {
        from_type: &'static str,
        to_type: &'static str,
        value: String,
    },

    #[error("Document retrieval failed for '{uri}': {message}")]
    DocumentRetrieval { uri: String, message: String },

    #[error("Invalid URI: {0}")]
    UriError(String),

    #[error("Recursive path configuration error: {0}")]
    RecursionConfiguration(String),

    #[error("Unknown function {name}#{arity}")]
    UnknownFunction { name: QName, arity: usize },

    #[error("Focus item is required but not set")]
    MissingFocus,

    #[error("Expression error: {0}")]
    Expression(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MetapathError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn index(index: i64, size: usize) -> Self {
        Self::IndexError { index, size }
    }

    pub fn cardinality(expected: &'static str, actual: usize) -> Self {
        Self::CardinalityError { expected, actual }
    }

    pub fn retrieval(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentRetrieval {
            uri: uri.into(),
            message: message.into(),
        }
    }
}
