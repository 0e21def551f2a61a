//! Error types for palette extraction.

use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors surfaced by an extraction call.
///
/// Every variant carries a human-readable message. No partial results are
/// returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Buffer length, row stride or pixel format metadata disagree.
    #[error("invalid image format: {0}")]
    InvalidFormat(String),
    /// Width or height is zero.
    #[error("empty image: {0}")]
    EmptyImage(String),
    /// The quantizer received no samples to work with.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    /// A core invariant was broken. Indicates a bug, never bad input.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

/// Discriminant of [`ExtractError`], without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    EmptyImage,
    DegenerateInput,
    InternalInvariantViolation,
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            ExtractError::EmptyImage(_) => ErrorKind::EmptyImage,
            ExtractError::DegenerateInput(_) => ErrorKind::DegenerateInput,
            ExtractError::InternalInvariantViolation(_) => ErrorKind::InternalInvariantViolation,
        }
    }

    /// Caller-input errors. The caller must fix the input; retrying is pointless.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidFormat(_) | ExtractError::EmptyImage(_)
        )
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "palette extraction invariant violated");
        ExtractError::InternalInvariantViolation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = ExtractError::EmptyImage("width is 0".into());
        assert_eq!(err.kind(), ErrorKind::EmptyImage);
        assert!(err.is_input_error());

        let err = ExtractError::invariant("weight 1.5 out of range");
        assert_eq!(err.kind(), ErrorKind::InternalInvariantViolation);
        assert!(!err.is_input_error());
    }

    #[test]
    fn display_includes_message() {
        let err = ExtractError::InvalidFormat("expected 16 bytes, got 12".into());
        assert_eq!(
            err.to_string(),
            "invalid image format: expected 16 bytes, got 12"
        );
    }
}
