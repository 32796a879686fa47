//! Type-safe message trait definitions.
//!
//! This crate provides the core `CourierMessage` trait that all message types
//! should implement. The trait associates a message type with its topic.

use serde::{Deserialize, Serialize};

/// Trait for types that can be published as messages.
///
/// Implementors must specify the topic where messages of this type should be
/// sent. The trait also requires `Serialize` and `Deserialize` for JSON
/// encoding/decoding.
///
/// # Example
///
/// ```
/// use courier_messages::CourierMessage;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct UserCreated {
///     user_id: String,
///     email: String,
/// }
///
/// impl CourierMessage for UserCreated {
///     const TOPIC: &'static str = "user.created";
/// }
/// ```
pub trait CourierMessage: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    /// The topic where messages of this type should be sent.
    const TOPIC: &'static str;
}
