//! Batching pipeline between the input buffer and the object store.
//!
//! The batcher *is* the shared buffer: inputs call `insert` (non-blocking,
//! bounded queue, drop-oldest on overflow) and a single background task
//! drains the queue whenever either the size threshold is reached or the
//! flush interval elapses. Each drained payload is parsed as a log entry
//! (or wrapped, so nothing is dropped), pushed into the recent-logs ring,
//! then uploaded as a gzip JSON batch. A failed upload is logged and the
//! batch is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use loggate_inputs::model::LogEntry;
use loggate_inputs::InputBuffer;
use loggate_telemetry::events;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::recent::{RecentLogsRing, StatusStore};
use crate::storage::{encode_batch, key_for_batch, ObjectStore, BATCH_EXT};

/// Batcher tuning.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Entries per uploaded batch; reaching this count triggers a flush.
    pub max_batch_size: usize,
    /// Maximum time between flush attempts.
    pub flush_interval: Duration,
    /// Buffered payloads beyond this evict the oldest.
    pub queue_capacity: usize,
    /// Tenant segment of the object key; empty maps to `default`.
    pub project_id: String,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            flush_interval: Duration::from_secs(30),
            queue_capacity: 10_000,
            project_id: "default".to_string(),
        }
    }
}

/// The shared ingestion buffer plus its background flusher.
pub struct Batcher {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    config: BatcherConfig,
    store: Arc<dyn ObjectStore>,
    recent: Arc<RecentLogsRing>,
    status: Arc<StatusStore>,
    queue: Mutex<VecDeque<Bytes>>,
    wake: Notify,
    shutdown: CancellationToken,
}

impl Batcher {
    pub fn new(
        config: BatcherConfig,
        store: Arc<dyn ObjectStore>,
        recent: Arc<RecentLogsRing>,
        status: Arc<StatusStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                recent,
                status,
                queue: Mutex::new(VecDeque::new()),
                wake: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the background flush task. Calling twice is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock().expect("lock poisoned");
        if worker.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *worker = Some(tokio::spawn(run(inner)));
    }

    /// Stop the background task after one final drain and flush.
    pub async fn stop(&self) {
        self.inner.shutdown.cancel();
        let handle = self.worker.lock().expect("lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl InputBuffer for Batcher {
    fn insert(&self, payload: Bytes) {
        self.inner.insert_payload(payload);
    }
}

async fn run(inner: Arc<Inner>) {
    let mut ticker = tokio::time::interval(inner.config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the loop waits a
    // full interval before its first timed flush.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = inner.wake.notified() => {
                ticker.reset();
            }
            _ = inner.shutdown.cancelled() => break,
        }
        inner.flush_pending().await;
    }

    // Final drain on shutdown.
    inner.flush_pending().await;
}

impl Inner {
    fn insert_payload(&self, payload: Bytes) {
        let len = {
            let mut queue = self.queue.lock().expect("lock poisoned");
            if queue.len() == self.config.queue_capacity {
                queue.pop_front();
                tracing::warn!(
                    event = events::BUFFER_OVERFLOW,
                    capacity = self.config.queue_capacity,
                    "ingestion buffer full; dropping oldest payload"
                );
            }
            queue.push_back(payload);
            queue.len()
        };
        self.status.set_pending(len);
        if len >= self.config.max_batch_size {
            self.wake.notify_one();
        }
    }

    async fn flush_pending(&self) {
        let drained: Vec<Bytes> = {
            let mut queue = self.queue.lock().expect("lock poisoned");
            let drained = queue.drain(..).collect();
            self.status.set_pending(queue.len());
            drained
        };
        if drained.is_empty() {
            return;
        }

        for chunk in drained.chunks(self.config.max_batch_size) {
            let entries: Vec<LogEntry> = chunk.iter().map(parse_or_wrap).collect();

            // Make entries observable to readers before the upload runs.
            for entry in &entries {
                self.recent.add_entry(entry.clone());
            }

            let payload = match encode_batch(&entries) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(
                        event = events::FLUSH_FAILED,
                        error = %err,
                        count = entries.len(),
                        "encode batch failed; dropping batch"
                    );
                    continue;
                }
            };

            let batch_id = Uuid::new_v4().simple().to_string();
            let key = key_for_batch(&self.config.project_id, &batch_id, BATCH_EXT);
            match self
                .store
                .put_object(&key, payload, "application/gzip")
                .await
            {
                Ok(()) => {
                    self.status.record_upload(entries.len(), &key);
                    tracing::info!(
                        event = events::BATCH_FLUSHED,
                        count = entries.len(),
                        key = %key,
                        "uploaded log batch"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        event = events::FLUSH_FAILED,
                        error = %err,
                        count = entries.len(),
                        "batch upload failed; dropping batch"
                    );
                }
            }
        }
    }
}

/// Parse a payload as a well-formed log entry, or wrap it so no record is
/// ever dropped.
fn parse_or_wrap(payload: &Bytes) -> LogEntry {
    if let Ok(entry) = serde_json::from_slice::<LogEntry>(payload) {
        if entry.is_well_formed() {
            return entry;
        }
    }
    LogEntry {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        service: "raw".to_string(),
        level: "info".to_string(),
        message: String::from_utf8_lossy(payload).into_owned(),
        ..Default::default()
    }
}
