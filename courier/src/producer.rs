//! Type-safe producer over the topic core.

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{CourierError, Result};
use courier_messages::CourierMessage;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type-safe producer.
///
/// The producer provides a generic `send` method that accepts any type
/// implementing `CourierMessage`. Messages are automatically serialized to
/// JSON and appended to the topic named by the message type, after passing
/// the owning connection's liveness gate.
///
/// # Example
///
/// ```no_run
/// use courier::Producer;
/// use courier::CourierMessage;
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
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let producer = Producer::new("localhost:9092")?;
///
///     let message = UserCreated {
///         user_id: "123".to_string(),
///     };
///
///     producer.send(&message).await?;
///     Ok(())
/// }
/// ```
pub struct Producer {
    connection: Connection,
}

impl Producer {
    /// Creates a producer with its own connection.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated list of brokers (e.g., "localhost:9092")
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be created.
    pub fn new(brokers: &str) -> Result<Self> {
        info!("Creating producer with brokers: {}", brokers);

        let config = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("queue.buffering.max.messages", "100000")
            .set("queue.buffering.max.kbytes", "1048576")
            .set("batch.num.messages", "10000");

        Self::from_config(config)
    }

    /// Creates a producer with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Pre-built ClientConfig
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be created.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let connection = Connection::from_config(config)?;
        connection.connect();
        Ok(Self { connection })
    }

    /// Attaches a producer to an existing connection.
    ///
    /// Useful when a producer and consumer should share one session, so that
    /// records appended by one side are visible to the other.
    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Handle to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Sends a typed message.
    ///
    /// The message is serialized to JSON and appended to the topic named by
    /// the message type's `TOPIC` constant. Keyless sends are spread
    /// round-robin across the topic's partitions.
    ///
    /// # Arguments
    ///
    /// * `message` - A reference to a message implementing `CourierMessage`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the connection is not
    /// established.
    pub async fn send<T: CourierMessage>(&self, message: &T) -> Result<()> {
        let topic = T::TOPIC;

        let payload = serde_json::to_vec(message)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;

        debug!(
            "Sending message to topic '{}' ({} bytes)",
            topic,
            payload.len()
        );

        let handle = self.connection.lookup_or_create(topic)?;
        match handle.native_handle() {
            Ok(native) => {
                let (partition, offset) = native.append(None, &payload);
                debug!(
                    "Message sent to topic '{}' (partition: {}, offset: {})",
                    topic, partition, offset
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to send message to topic '{}': {}", topic, e);
                Err(e)
            }
        }
    }

    /// Sends a typed message with a specific key.
    ///
    /// The key is hashed to pick the partition, so all messages with the same
    /// key land on the same partition.
    ///
    /// # Arguments
    ///
    /// * `message` - A reference to a message implementing `CourierMessage`
    /// * `key` - The message key
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the connection is not
    /// established.
    pub async fn send_with_key<T: CourierMessage>(&self, message: &T, key: &str) -> Result<()> {
        let topic = T::TOPIC;

        let payload = serde_json::to_vec(message)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;

        debug!(
            "Sending message to topic '{}' with key '{}' ({} bytes)",
            topic,
            key,
            payload.len()
        );

        let handle = self.connection.lookup_or_create(topic)?;
        match handle.native_handle() {
            Ok(native) => {
                let (partition, offset) = native.append(Some(key.as_bytes()), &payload);
                debug!(
                    "Message sent to topic '{}' with key '{}' (partition: {}, offset: {})",
                    topic, key, partition, offset
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to send message to topic '{}' with key '{}': {}",
                    topic, key, e
                );
                Err(e)
            }
        }
    }

    /// Flushes any pending messages.
    ///
    /// The in-process log delivers on append, so a connected flush has
    /// nothing left to wait for.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if the connection is not established.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        if !self.connection.is_connected() {
            return Err(CourierError::NotConnected);
        }
        debug!("Flush complete within {:?}", timeout);
        Ok(())
    }
}
