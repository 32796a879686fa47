//! In-process messaging client core with a typed produce/consume facade.
//!
//! `courier` reimplements the topic subsystem of a publish/subscribe
//! messaging client: connections own named topics, each topic carries a
//! configuration snapshot resolved from its overlay plus the connection
//! defaults, and every operation that would touch the network re-checks
//! connection liveness first.
//!
//! # Features
//!
//! - Topic registry with per-connection coalescing of duplicate creations
//! - Read-through config resolution with a 3-way lookup outcome
//!   (value / absent / invalid)
//! - Connection gate: `Topic::native_handle()` re-checks readiness per call
//! - Type-safe producer with `send<T: CourierMessage>(&T)` API
//! - Consumer with topic-based routing using `HashMap<&'static str, HandlerBox>`
//! - `topic_handlers!` macro for easy handler registration
//! - JSON serialization/deserialization
//! - Offset commit on success, retry with backoff on error
//! - Graceful shutdown support
//! - Integrated tracing
//!
//! # Example
//!
//! ```no_run
//! use courier::{Connection, CourierMessage, Producer, TopicConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct UserCreated {
//!     user_id: String,
//! }
//!
//! impl CourierMessage for UserCreated {
//!     const TOPIC: &'static str = "user.created";
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connection = Connection::new("localhost:9092")?;
//!     connection.connect();
//!
//!     let topic = connection.create_topic("user.created", TopicConfig::new().set("acks", "1"))?;
//!     assert_eq!(topic.get("acks")?, Some("1".to_string()));
//!
//!     let producer = Producer::with_connection(connection);
//!     let message = UserCreated {
//!         user_id: "123".to_string(),
//!     };
//!     producer.send(&message).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod consumer;
mod error;
mod producer;
mod topic;

pub use config::{ClientConfig, TopicConfig};
pub use connection::Connection;
pub use consumer::{Consumer, ConsumerConfig, HandlerBox, ShutdownHandle};
pub use error::{CourierError, Result};
pub use producer::Producer;
pub use topic::{NativeTopic, Record, Topic};

/// Re-export the CourierMessage trait for convenience
pub use courier_messages::CourierMessage;

/// Macro to create a HashMap of topic handlers for the Consumer.
///
/// # Example
///
/// ```no_run
/// use courier::{topic_handlers, CourierMessage};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct UserCreated {
///     user_id: String,
/// }
///
/// impl CourierMessage for UserCreated {
///     const TOPIC: &'static str = "user.created";
/// }
///
/// async fn handle_user_created(msg: UserCreated) -> anyhow::Result<()> {
///     println!("User created: {:?}", msg);
///     Ok(())
/// }
///
/// let handlers = topic_handlers![
///     UserCreated => handle_user_created,
/// ];
/// ```
#[macro_export]
macro_rules! topic_handlers {
    ($($msg_type:ty => $handler:expr),* $(,)?) => {{
        let mut map: ::std::collections::HashMap<
            &'static str,
            $crate::HandlerBox,
        > = ::std::collections::HashMap::new();
        $(
            let handler = ::std::sync::Arc::new($handler);
            map.insert(
                <$msg_type as $crate::CourierMessage>::TOPIC,
                Box::new(move |payload: &[u8]| {
                    let handler = ::std::sync::Arc::clone(&handler);
                    let payload = payload.to_vec();
                    Box::pin(async move {
                        let msg: $msg_type = ::serde_json::from_slice(&payload)
                            .map_err(|e| $crate::CourierError::Deserialization(e.to_string()))?;
                        handler(msg).await
                            .map_err(|e| $crate::CourierError::Handler(e.to_string()))
                    })
                })
            );
        )*
        map
    }};
}
