//! Connection- and topic-level configuration with read-through resolution.
//!
//! Configuration is an ordered string-to-string mapping. A topic's effective
//! configuration is resolved once, at creation, by layering the topic overlay
//! over the connection defaults; lookups afterwards go through the snapshot's
//! current validity state rather than a pre-materialized answer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{CourierError, Result};

/// Connection-level configuration.
///
/// Unknown keys are accepted and passed through untouched so that callers can
/// carry settings this library does not interpret; known keys are validated
/// when the connection is created.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    entries: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a configuration key, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value for a key, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (key, value) in &self.entries {
            validate_entry(key, value)?;
        }
        Ok(())
    }
}

/// Topic-level configuration overlay.
///
/// Values set here override the owning connection's defaults for the topic
/// being created.
#[derive(Debug, Clone, Default)]
pub struct TopicConfig {
    entries: BTreeMap<String, String>,
    eager_validation: bool,
}

impl TopicConfig {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a topic-level key, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Requests that connection readiness be checked at topic creation time
    /// instead of deferred to first use.
    pub fn with_eager_validation(mut self, eager: bool) -> Self {
        self.eager_validation = eager;
        self
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, String> {
        self.entries
    }

    pub(crate) fn eager_validation(&self) -> bool {
        self.eager_validation
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (key, value) in &self.entries {
            validate_entry(key, value)?;
        }
        Ok(())
    }
}

/// Point-in-time resolved configuration for a single topic.
///
/// The entries never change after resolution. Validity can change: when the
/// owning connection is torn down the snapshot is marked invalid, and every
/// subsequent lookup reports that instead of a stale value.
#[derive(Debug)]
pub(crate) struct ConfigSnapshot {
    entries: BTreeMap<String, String>,
    invalidated: AtomicBool,
}

/// Outcome of a single configuration lookup.
pub(crate) enum ConfLookup {
    Value(String),
    Unknown,
    Invalid,
}

impl ConfigSnapshot {
    /// Layers the topic overlay over the connection defaults.
    pub(crate) fn resolve(defaults: &ClientConfig, overlay: &TopicConfig) -> Self {
        let mut entries = defaults.entries().clone();
        for (key, value) in overlay.entries() {
            entries.insert(key.clone(), value.clone());
        }
        Self {
            entries,
            invalidated: AtomicBool::new(false),
        }
    }

    /// Looks up a key. Validity is consulted on every call, not cached.
    pub(crate) fn fetch(&self, key: &str) -> ConfLookup {
        if self.invalidated.load(Ordering::Acquire) {
            return ConfLookup::Invalid;
        }
        match self.entries.get(key) {
            Some(value) => ConfLookup::Value(value.clone()),
            None => ConfLookup::Unknown,
        }
    }

    /// Marks the snapshot as retroactively invalid.
    pub(crate) fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    /// Partition count for the topic, defaulting to a single partition.
    pub(crate) fn partitions(&self) -> u32 {
        self.entries
            .get("num.partitions")
            .and_then(|value| value.parse().ok())
            .unwrap_or(1)
    }
}

fn validate_entry(key: &str, value: &str) -> Result<()> {
    let ok = match key {
        "bootstrap.servers" => !value.trim().is_empty(),
        "acks" => matches!(value, "0" | "1" | "all" | "-1"),
        "compression.codec" => matches!(value, "none" | "gzip" | "snappy" | "lz4" | "zstd"),
        "num.partitions" => value.parse::<u32>().map(|n| n > 0).unwrap_or(false),
        "message.timeout.ms"
        | "request.timeout.ms"
        | "session.timeout.ms"
        | "queue.buffering.max.messages"
        | "queue.buffering.max.kbytes"
        | "batch.num.messages" => value.parse::<u64>().is_ok(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(CourierError::InvalidArgument(format!(
            "Invalid value '{value}' for config key '{key}'"
        )))
    }
}
