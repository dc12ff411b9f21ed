use thiserror::Error;

/// Errors that can occur while constructing message or metadata types.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The metadata key is empty, unnamespaced, or contains invalid characters.
    #[error("Invalid metadata key: {0}")]
    InvalidKey(String),
}

/// A specialized Result type for message operations.
pub type MessageResult<T> = Result<T, MessageError>;
