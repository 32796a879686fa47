//! Error types for the courier client core.

use thiserror::Error;

/// Result type alias for courier operations.
pub type Result<T> = std::result::Result<T, CourierError>;

/// Errors that can occur in the client core and its produce/consume facade.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Malformed input at the API boundary. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The owning connection is absent or not established. Transient;
    /// callers may retry after reconnecting.
    #[error("Connection is not established")]
    NotConnected,

    /// A topic's configuration snapshot no longer matches the library
    /// state. The topic must be recreated.
    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    /// A topic already exists on this connection with a different
    /// configuration overlay.
    #[error("Topic '{0}' already exists with a different configuration")]
    ConfigConflict(String),

    /// Error serializing a message to JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error deserializing a message from JSON.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Error from a message handler.
    #[error("Handler error: {0}")]
    Handler(String),
}
