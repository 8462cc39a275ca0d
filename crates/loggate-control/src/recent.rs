//! Recent logs ring and upload status store.
//!
//! Both are process-wide observation surfaces: readers snapshot under a
//! read lock while the batcher keeps writing. A reader may observe entries
//! whose batch is still in flight to the object store.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use loggate_inputs::model::LogEntry;
use serde::Serialize;

/// Default capacity of the recent logs ring.
pub const DEFAULT_RECENT_CAPACITY: usize = 200;

/// A parsed entry plus the moment the batcher saw it.
#[derive(Debug, Clone, Serialize)]
pub struct RecentLogEntry {
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: LogEntry,
}

/// Bounded FIFO of the most recent parsed entries.
pub struct RecentLogsRing {
    capacity: usize,
    entries: RwLock<VecDeque<RecentLogEntry>>,
}

impl RecentLogsRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn add_entry(&self, entry: LogEntry) {
        let mut entries = self.entries.write().expect("lock poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(RecentLogEntry {
            received_at: Utc::now(),
            entry,
        });
    }

    /// Snapshot in insertion order.
    pub fn get_recent(&self) -> Vec<RecentLogEntry> {
        let entries = self.entries.read().expect("lock poisoned");
        entries.iter().cloned().collect()
    }
}

/// Snapshot of the batcher's flush status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadStatus {
    pub batcher_enabled: bool,
    pub last_upload_at: Option<DateTime<Utc>>,
    pub last_upload_key: Option<String>,
    pub last_upload_count: usize,
    pub pending_count: usize,
}

/// Process-wide scalars describing the last flush and the pending backlog.
pub struct StatusStore {
    inner: RwLock<UploadStatus>,
}

impl StatusStore {
    pub fn new(batcher_enabled: bool) -> Self {
        Self {
            inner: RwLock::new(UploadStatus {
                batcher_enabled,
                ..Default::default()
            }),
        }
    }

    pub fn set_pending(&self, pending: usize) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.pending_count = pending;
    }

    pub fn record_upload(&self, count: usize, key: &str) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.last_upload_at = Some(Utc::now());
        inner.last_upload_key = Some(key.to_string());
        inner.last_upload_count = count;
    }

    pub fn snapshot(&self) -> UploadStatus {
        self.inner.read().expect("lock poisoned").clone()
    }
}
