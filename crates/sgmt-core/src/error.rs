//! Error types for the row-stream engine.

use thiserror::Error;

/// Errors raised by stages and by the stream merger.
///
/// Stream exhaustion is not an error: every row producer simply ends
/// (`Iterator::next` returns `None`).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configured key, field or edge column cannot be used with the input.
    #[error("malformed key specification: column '{column}' {reason}")]
    MalformedKeySpec { column: String, reason: String },

    /// A merged source declares fields that conflict with the first source.
    #[error("ambiguous schema: input #{origin} has fields [{found}], expected [{expected}]")]
    AmbiguousSchema {
        origin: usize,
        expected: String,
        found: String,
    },

    /// Invalid stage argument (bad `DST=SRC` mapping, unusable pattern, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by an upstream row source (I/O, parse errors).
    #[error(transparent)]
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    pub(crate) fn malformed(column: &str, reason: impl Into<String>) -> Self {
        Self::MalformedKeySpec {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;
