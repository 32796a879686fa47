//! Topic handles, the in-process record log, and the connection-liveness gate.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{ConfLookup, ConfigSnapshot};
use crate::connection::ConnectionInner;
use crate::error::{CourierError, Result};

/// A single record in a topic log.
#[derive(Debug, Clone)]
pub struct Record {
    /// Partition the record was assigned to.
    pub partition: i32,
    /// Offset of the record within the topic log.
    pub offset: i64,
    /// Optional key bytes used for partition assignment.
    pub key: Option<Vec<u8>>,
    /// Message payload.
    pub payload: Vec<u8>,
    /// Append time, milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
}

/// Shared per-topic state: the native side of a topic handle.
///
/// Owned by the connection registry; `Topic` and `NativeTopic` handles hold
/// strong references into it.
#[derive(Debug)]
pub(crate) struct TopicState {
    name: String,
    config: ConfigSnapshot,
    overlay: BTreeMap<String, String>,
    records: Mutex<Vec<Record>>,
    round_robin: AtomicU32,
}

impl TopicState {
    pub(crate) fn new(
        name: String,
        config: ConfigSnapshot,
        overlay: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name,
            config,
            overlay,
            records: Mutex::new(Vec::new()),
            round_robin: AtomicU32::new(0),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    /// The overlay the topic was created with, for duplicate-creation checks.
    pub(crate) fn overlay(&self) -> &BTreeMap<String, String> {
        &self.overlay
    }

    fn append(&self, key: Option<&[u8]>, payload: &[u8]) -> (i32, i64) {
        let partitions = self.config.partitions().max(1);
        let partition = match key {
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                (hasher.finish() % u64::from(partitions)) as i32
            }
            None => (self.round_robin.fetch_add(1, Ordering::Relaxed) % partitions) as i32,
        };

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let offset = records.len() as i64;
        records.push(Record {
            partition,
            offset,
            key: key.map(<[u8]>::to_vec),
            payload: payload.to_vec(),
            timestamp_ms: now_ms(),
        });
        (partition, offset)
    }
}

/// Opaque handle to the native topic object, obtained through
/// [`Topic::native_handle`].
#[derive(Debug, Clone)]
pub struct NativeTopic {
    state: Arc<TopicState>,
}

impl NativeTopic {
    /// Returns the topic name.
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Appends a record, returning its (partition, offset) assignment.
    ///
    /// Keyed records hash to a stable partition; keyless records are spread
    /// round-robin across the topic's partitions.
    pub fn append(&self, key: Option<&[u8]>, payload: &[u8]) -> (i32, i64) {
        self.state.append(key, payload)
    }

    /// Copies out up to `max` records starting at `from_offset`.
    pub fn fetch(&self, from_offset: i64, max: usize) -> Vec<Record> {
        let records = self.state.records.lock().unwrap_or_else(|e| e.into_inner());
        let start = from_offset.max(0) as usize;
        records.iter().skip(start).take(max).cloned().collect()
    }

    /// Offset one past the last appended record.
    pub fn high_watermark(&self) -> i64 {
        let records = self.state.records.lock().unwrap_or_else(|e| e.into_inner());
        records.len() as i64
    }
}

/// Handle to a named topic on a connection.
///
/// The handle shares the topic's resolved configuration snapshot and keeps a
/// non-owning reference to the connection, used only for liveness checks.
#[derive(Debug, Clone)]
pub struct Topic {
    state: Arc<TopicState>,
    connection: Weak<ConnectionInner>,
}

impl Topic {
    pub(crate) fn new(state: Arc<TopicState>, connection: Weak<ConnectionInner>) -> Self {
        Self { state, connection }
    }

    /// Returns the topic name. Never requires connectivity.
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Looks up a configuration key in the topic's resolved snapshot.
    ///
    /// Returns `Ok(None)` for keys that were never set, for any key string
    /// including the empty string. Fails with `ConfigInvalid` once the
    /// snapshot has been invalidated by connection teardown; such a topic
    /// must be recreated.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.state.config().fetch(key) {
            ConfLookup::Value(value) => Ok(Some(value)),
            ConfLookup::Unknown => Ok(None),
            ConfLookup::Invalid => Err(CourierError::ConfigInvalid(format!(
                "Configuration for topic '{}' is no longer valid",
                self.state.name()
            ))),
        }
    }

    /// Unwraps the native topic handle.
    ///
    /// The owning connection's readiness flag is re-checked on every call;
    /// the result is never cached across connect/disconnect cycles. Fails
    /// with `NotConnected` when the connection has been dropped or is not
    /// established.
    pub fn native_handle(&self) -> Result<NativeTopic> {
        let connection = self
            .connection
            .upgrade()
            .ok_or(CourierError::NotConnected)?;
        if !connection.is_connected() {
            return Err(CourierError::NotConnected);
        }
        Ok(NativeTopic {
            state: Arc::clone(&self.state),
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
