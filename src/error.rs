//! Typed errors surfaced by the segmentation engine and clip export

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// Bad durations, malformed timestamps, missing section fields or
    /// section boundaries outside the buffer. Aborts the recording.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single clip could not be written. Reported per clip.
    #[error("failed to persist clip {name}: {message}")]
    Persistence { name: String, message: String },
}

impl SplitError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SplitError::InvalidConfiguration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SplitError::InvalidConfiguration(_))
    }
}

pub type SplitResult<T> = std::result::Result<T, SplitError>;
