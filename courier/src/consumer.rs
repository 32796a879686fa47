//! Type-safe consumer with topic-based routing over the topic core.

use crate::connection::Connection;
use crate::error::{CourierError, Result};
use crate::topic::Topic;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Type alias for message handlers.
///
/// Handlers are async functions that take a message payload and return a Result.
pub type HandlerBox =
    Box<dyn Fn(&[u8]) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// Configuration for the consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Consumer group ID, used for logging and offset bookkeeping.
    pub group_id: String,

    /// Maximum number of retry attempts on handler error.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub initial_backoff: Duration,

    /// Maximum backoff duration for retries.
    pub max_backoff: Duration,

    /// Whether to commit offsets on receipt instead of after successful
    /// handling (default: false, we commit on success).
    pub auto_commit: bool,

    /// How long to sleep when a poll turns up no records.
    pub poll_interval: Duration,

    /// Maximum records fetched from one topic per poll.
    pub max_poll_records: usize,
}

impl ConsumerConfig {
    /// Creates a new consumer configuration.
    ///
    /// # Arguments
    ///
    /// * `group_id` - Consumer group ID
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            auto_commit: false,
            poll_interval: Duration::from_millis(100),
            max_poll_records: 64,
        }
    }

    /// Sets the maximum number of retry attempts.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial backoff duration.
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Sets the maximum backoff duration.
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Commits offsets on receipt instead of after successful handling.
    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    /// Sets the idle poll interval.
    pub fn with_poll_interval(mut self, duration: Duration) -> Self {
        self.poll_interval = duration;
        self
    }

    /// Sets the per-topic fetch batch size.
    pub fn with_max_poll_records(mut self, max: usize) -> Self {
        self.max_poll_records = max;
        self
    }
}

/// Type-safe consumer with topic-based message routing.
///
/// The consumer routes records to handlers based on their topic using a
/// HashMap. It includes retry logic with exponential backoff, offset commit
/// on success, and graceful shutdown support.
pub struct Consumer {
    connection: Connection,
    handlers: HashMap<&'static str, HandlerBox>,
    config: ConsumerConfig,
    subscriptions: Mutex<HashMap<&'static str, Topic>>,
    committed: Mutex<HashMap<&'static str, i64>>,
    shutdown: Arc<RwLock<bool>>,
}

impl Consumer {
    /// Creates a new consumer with topic handlers.
    ///
    /// # Arguments
    ///
    /// * `connection` - The session to consume over
    /// * `config` - Consumer configuration
    /// * `handlers` - HashMap of topic names to handler functions
    ///
    /// # Example
    ///
    /// ```no_run
    /// use courier::{Connection, Consumer, ConsumerConfig, CourierMessage, topic_handlers};
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
    /// # fn example() -> anyhow::Result<()> {
    /// let connection = Connection::new("localhost:9092")?;
    /// connection.connect();
    ///
    /// let config = ConsumerConfig::new("my-service");
    /// let handlers = topic_handlers![
    ///     UserCreated => handle_user_created,
    /// ];
    ///
    /// let consumer = Consumer::new(connection, config, handlers);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        connection: Connection,
        config: ConsumerConfig,
        handlers: HashMap<&'static str, HandlerBox>,
    ) -> Self {
        info!(
            "Creating consumer for group '{}' with {} handler(s)",
            config.group_id,
            handlers.len()
        );

        Self {
            connection,
            handlers,
            config,
            subscriptions: Mutex::new(HashMap::new()),
            committed: Mutex::new(HashMap::new()),
            shutdown: Arc::new(RwLock::new(false)),
        }
    }

    /// Subscribes to all topics that have registered handlers.
    ///
    /// Each topic is resolved through the connection's registry and checked
    /// against the liveness gate once up front; the gate is re-checked on
    /// every poll afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a topic name is invalid or the connection is not
    /// established.
    pub fn subscribe(&self) -> Result<()> {
        let topics: Vec<&'static str> = self.handlers.keys().copied().collect();
        info!("Subscribing to topics: {:?}", topics);

        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        for name in topics {
            let topic = self.connection.lookup_or_create(name)?;
            topic.native_handle()?;
            subscriptions.insert(name, topic);
        }
        Ok(())
    }

    /// Starts consuming records.
    ///
    /// This method runs until a shutdown signal is received via `shutdown()`.
    /// Records are routed to their topic handlers, with automatic retries on
    /// failure and offset commit on success. A record whose retries are
    /// exhausted is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `subscribe()` was not called first.
    pub async fn run(&self) -> Result<()> {
        info!("Starting consumer loop for group '{}'", self.config.group_id);

        let subscriptions: HashMap<&'static str, Topic> = {
            let subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
            subscriptions.clone()
        };
        if subscriptions.is_empty() {
            return Err(CourierError::InvalidArgument(
                "No subscriptions; call subscribe() before run()".to_string(),
            ));
        }

        let mut cursors: HashMap<&'static str, i64> =
            subscriptions.keys().map(|name| (*name, 0)).collect();

        loop {
            // Check for shutdown signal
            if *self.shutdown.read().await {
                info!("Shutdown signal received, stopping consumer");
                break;
            }

            let mut received = false;

            for (name, topic) in &subscriptions {
                // The gate is consulted on every poll, not once at subscribe
                let native = match topic.native_handle() {
                    Ok(native) => native,
                    Err(e) => {
                        error!("Error polling topic '{}': {}", name, e);
                        continue;
                    }
                };

                let cursor = cursors.entry(*name).or_insert(0);
                let records = native.fetch(*cursor, self.config.max_poll_records);

                for record in records {
                    received = true;

                    debug!(
                        "Received record from topic '{}' (partition: {}, offset: {})",
                        name, record.partition, record.offset
                    );

                    if self.config.auto_commit {
                        self.commit(*name, record.offset + 1);
                    }

                    if let Some(handler) = self.handlers.get(name) {
                        match self.process_with_retry(handler, &record.payload).await {
                            Ok(()) => {
                                if !self.config.auto_commit {
                                    self.commit(*name, record.offset + 1);
                                }
                            }
                            Err(e) => {
                                error!(
                                    "Failed to process record from topic '{}' after retries: {}",
                                    name, e
                                );
                                // Continue processing other records
                            }
                        }
                    } else {
                        warn!("No handler registered for topic '{}'", name);
                    }

                    *cursor = record.offset + 1;
                }
            }

            if !received {
                sleep(self.config.poll_interval).await;
            }
        }

        info!("Consumer stopped");
        Ok(())
    }

    /// Last committed offset for a topic, if any record was committed.
    pub fn committed_offset(&self, topic: &str) -> Option<i64> {
        let committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
        committed.get(topic).copied()
    }

    fn commit(&self, topic: &'static str, offset: i64) {
        let mut committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
        committed.insert(topic, offset);
    }

    /// Processes a record with retry logic and exponential backoff.
    async fn process_with_retry(&self, handler: &HandlerBox, payload: &[u8]) -> Result<()> {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff;

        loop {
            match handler(payload).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!("Record processed successfully after {} retries", attempt);
                    }
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;

                    if attempt > self.config.max_retries {
                        error!(
                            "Failed to process record after {} attempts: {}",
                            self.config.max_retries, e
                        );
                        return Err(e);
                    }

                    warn!(
                        "Error processing record (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, self.config.max_retries, e, backoff
                    );

                    sleep(backoff).await;

                    // Exponential backoff with cap
                    backoff = std::cmp::min(backoff * 2, self.config.max_backoff);
                }
            }
        }
    }

    /// Requests a graceful shutdown of the consumer.
    ///
    /// This signals the consumer to stop processing records and exit cleanly.
    pub async fn shutdown(&self) {
        info!("Requesting consumer shutdown");
        let mut shutdown = self.shutdown.write().await;
        *shutdown = true;
    }

    /// Returns a shutdown handle that can be used to signal shutdown from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// Handle for requesting consumer shutdown from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<RwLock<bool>>,
}

impl ShutdownHandle {
    /// Requests a graceful shutdown of the consumer.
    pub async fn shutdown(&self) {
        info!("Requesting consumer shutdown via handle");
        let mut shutdown = self.shutdown.write().await;
        *shutdown = true;
    }
}
