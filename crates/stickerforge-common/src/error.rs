//! Common error types used throughout stickerforge.

/// Common error type for stickerforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A name did not match any known variant.
    #[error("Unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },

    /// An operation list violates the required ordering.
    #[error("Invalid operation order: {0}")]
    OperationOrder(String),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Unknown error for a failed name lookup.
    pub fn unknown<S: Into<String>>(kind: &'static str, value: S) -> Self {
        Self::Unknown {
            kind,
            value: value.into(),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
