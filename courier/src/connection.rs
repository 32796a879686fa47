//! Connections: readiness flag, topic registry, teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::{ClientConfig, ConfigSnapshot, TopicConfig};
use crate::error::{CourierError, Result};
use crate::topic::{Topic, TopicState};

/// Topic names are capped at the broker-conventional limit.
const MAX_TOPIC_NAME_LEN: usize = 249;

#[derive(Debug)]
pub(crate) struct ConnectionInner {
    defaults: ClientConfig,
    connected: AtomicBool,
    topics: Mutex<HashMap<String, Arc<TopicState>>>,
}

impl ConnectionInner {
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// A client session against the messaging fabric.
///
/// The connection owns all topic state created through it and exposes the
/// readiness flag every topic operation consults before touching the network.
/// Clones share the same underlying session.
#[derive(Clone, Debug)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Creates a connection from a broker list, using default settings.
    pub fn new(brokers: &str) -> Result<Self> {
        Self::from_config(ClientConfig::new().set("bootstrap.servers", brokers))
    }

    /// Creates a connection from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a known key carries a malformed value or
    /// `bootstrap.servers` is missing or empty.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let brokers = config.get("bootstrap.servers").unwrap_or("").trim();
        if brokers.is_empty() {
            return Err(CourierError::InvalidArgument(
                "'bootstrap.servers' must be set".to_string(),
            ));
        }
        info!("Creating connection with brokers: {}", brokers);

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                defaults: config,
                connected: AtomicBool::new(false),
                topics: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Marks the session established. The engine that would drive real
    /// broker I/O sits below this layer; the flag is what topic operations
    /// observe.
    pub fn connect(&self) {
        self.inner.connected.store(true, Ordering::Release);
        info!("Connection established");
    }

    /// Marks the session not established. Topic handles stay valid; their
    /// native use fails with `NotConnected` until [`Connection::connect`] is
    /// called again.
    pub fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::Release);
        info!("Connection lost");
    }

    /// Whether the session is currently established. Cheap non-blocking read.
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Tears the session down: every owned topic's configuration snapshot is
    /// invalidated and the registry is cleared. Outstanding topic handles
    /// report `ConfigInvalid` on config lookups and `NotConnected` on native
    /// use; they must be recreated on a fresh connection.
    pub fn close(&self) {
        self.disconnect();
        let mut topics = self.inner.topics.lock().unwrap_or_else(|e| e.into_inner());
        for state in topics.values() {
            state.config().invalidate();
        }
        let released = topics.len();
        topics.clear();
        info!("Connection closed, {} topic(s) released", released);
    }

    /// Creates a topic on this connection, or coalesces with an existing one.
    ///
    /// A second creation under the same name returns a handle to the same
    /// logical topic when the overlay is identical, and fails with
    /// `ConfigConflict` when it differs: two handles for the same
    /// (connection, name) can never diverge in configuration.
    ///
    /// Creation is lazy by default: the readiness flag is first consulted
    /// when the topic is used. `TopicConfig::with_eager_validation(true)`
    /// moves that check to creation time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty or illegal name or a malformed
    /// config value, `NotConnected` for an eager creation on a session that
    /// is not established, and `ConfigConflict` for a divergent duplicate.
    pub fn create_topic(&self, name: &str, config: TopicConfig) -> Result<Topic> {
        validate_topic_name(name)?;
        config.validate()?;
        if config.eager_validation() && !self.is_connected() {
            return Err(CourierError::NotConnected);
        }

        let mut topics = self.inner.topics.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = topics.get(name) {
            if existing.overlay() == config.entries() {
                debug!("Reusing existing topic '{}'", name);
                return Ok(Topic::new(Arc::clone(existing), Arc::downgrade(&self.inner)));
            }
            return Err(CourierError::ConfigConflict(name.to_string()));
        }

        let snapshot = ConfigSnapshot::resolve(&self.inner.defaults, &config);
        let state = Arc::new(TopicState::new(
            name.to_string(),
            snapshot,
            config.into_entries(),
        ));
        topics.insert(name.to_string(), Arc::clone(&state));
        debug!("Created topic '{}'", name);
        Ok(Topic::new(state, Arc::downgrade(&self.inner)))
    }

    /// Attaches to a topic regardless of its overlay, creating it with an
    /// empty overlay if it does not exist yet. Used by the produce/consume
    /// paths, which address topics by name only.
    pub(crate) fn lookup_or_create(&self, name: &str) -> Result<Topic> {
        validate_topic_name(name)?;

        let mut topics = self.inner.topics.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = topics.get(name) {
            return Ok(Topic::new(Arc::clone(existing), Arc::downgrade(&self.inner)));
        }

        let snapshot = ConfigSnapshot::resolve(&self.inner.defaults, &TopicConfig::new());
        let state = Arc::new(TopicState::new(
            name.to_string(),
            snapshot,
            TopicConfig::new().into_entries(),
        ));
        topics.insert(name.to_string(), Arc::clone(&state));
        debug!("Created topic '{}'", name);
        Ok(Topic::new(state, Arc::downgrade(&self.inner)))
    }

    /// Names of all topics currently owned by this connection, sorted.
    pub fn topic_names(&self) -> Vec<String> {
        let topics = self.inner.topics.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = topics.keys().cloned().collect();
        names.sort();
        names
    }
}

fn validate_topic_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CourierError::InvalidArgument(
            "Topic name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_TOPIC_NAME_LEN {
        return Err(CourierError::InvalidArgument(format!(
            "Topic name exceeds {MAX_TOPIC_NAME_LEN} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(CourierError::InvalidArgument(format!(
            "'{name}' is not a valid topic name"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-'))
    {
        return Err(CourierError::InvalidArgument(format!(
            "Topic name contains illegal character '{c}'"
        )));
    }
    Ok(())
}
