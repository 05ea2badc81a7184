//! Sync queue status accessors
//!
//! The report only reads queue status; the queues themselves belong to the
//! sync subsystem. [`QueueStatus`] is the read surface the collector
//! consumes, and [`StoredQueue`] adapts the queue metadata persisted in the
//! options store to it.

use crate::config::ConfigStore;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Full-sync status fields holding Unix timestamps
const TIMESTAMP_FIELDS: &[&str] = &["started", "queue_finished", "send_started", "finished"];

/// Read-only status of a work queue
pub trait QueueStatus {
    /// Number of pending items
    fn size(&self) -> u64;

    /// Age of the oldest pending item, in seconds
    fn lag(&self) -> u64;
}

/// Queue accessor that always reports an empty queue
///
/// Stands in when a queue's backing state cannot be reached, so the report
/// degrades to zeroes instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyQueue;

impl QueueStatus for EmptyQueue {
    fn size(&self) -> u64 {
        0
    }

    fn lag(&self) -> u64 {
        0
    }
}

/// Queue status derived from queue metadata in the options store
///
/// The sync subsystem persists each queue as an option holding an array of
/// pending items with enqueue timestamps:
///
/// ```json
/// [{ "id": "1a", "timestamp": 1722000000 }, ...]
/// ```
///
/// Missing or malformed metadata reads as an empty queue.
pub struct StoredQueue<'a> {
    store: &'a dyn ConfigStore,
    option: String,
}

impl<'a> StoredQueue<'a> {
    /// Create an accessor for the queue stored under the given option name
    pub fn new(store: &'a dyn ConfigStore, option: impl Into<String>) -> Self {
        Self {
            store,
            option: option.into(),
        }
    }

    fn items(&self) -> Vec<Value> {
        self.store
            .get(&self.option)
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
    }

    fn lag_at(&self, now: u64) -> u64 {
        let oldest = self
            .items()
            .iter()
            .filter_map(|item| item.get("timestamp").and_then(Value::as_u64))
            .min();

        match oldest {
            Some(ts) => now.saturating_sub(ts),
            None => 0,
        }
    }
}

impl QueueStatus for StoredQueue<'_> {
    fn size(&self) -> u64 {
        self.items().len() as u64
    }

    fn lag(&self) -> u64 {
        self.lag_at(unix_now())
    }
}

/// Current Unix time in seconds
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Snapshot of the full-sync module's status map
///
/// Present only when the full-sync module has recorded a status. Timestamp
/// fields are rendered as RFC 2822 dates for readability; everything else
/// passes through untouched.
#[derive(Debug, Clone)]
pub struct FullSyncStatus {
    status: serde_json::Map<String, Value>,
}

impl FullSyncStatus {
    /// Read the status snapshot from the store, if the module recorded one
    pub fn from_store(store: &dyn ConfigStore) -> Option<Self> {
        let status = store.get("full_sync_status")?.as_object()?.clone();
        Some(Self { status })
    }

    /// Build a snapshot from an existing status map
    pub fn from_map(status: serde_json::Map<String, Value>) -> Self {
        Self { status }
    }

    /// Status map with timestamp fields rendered as RFC 2822 dates
    pub fn humanize(&self) -> serde_json::Map<String, Value> {
        self.status
            .iter()
            .map(|(key, value)| {
                let rendered = if TIMESTAMP_FIELDS.contains(&key.as_str()) {
                    humanize_timestamp(value)
                } else {
                    value.clone()
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

/// Render a Unix timestamp value as an RFC 2822 date string
///
/// Non-numeric and out-of-range values pass through unchanged.
fn humanize_timestamp(value: &Value) -> Value {
    value
        .as_i64()
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(|dt| Value::String(dt.to_rfc2822()))
        .unwrap_or_else(|| value.clone())
}
