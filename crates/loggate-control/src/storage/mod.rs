//! Object storage for log batches.
//!
//! Batches are gzip-compressed UTF-8 JSON — a single array of `LogEntry`
//! objects — addressed as
//! `logs/<project>/<YYYY>/<MM>/<DD>/<batch_id>.json.gz`.

mod s3;

pub use s3::S3ObjectStore;

use std::io::{Read, Write};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use loggate_inputs::model::LogEntry;
use serde::Serialize;
use thiserror::Error;

/// Object extension for uploaded batches.
pub const BATCH_EXT: &str = ".json.gz";

#[derive(Debug, Error)]
pub enum StorageError {
    /// The object store request itself failed (network, auth, missing key).
    #[error("object store request failed: {0}")]
    Request(String),

    /// The object content failed gzip or JSON decoding.
    #[error("corrupt batch object: {0}")]
    Corrupt(String),
}

/// Describes one stored object (for list responses).
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// S3-compatible client over a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist. Idempotent.
    async fn ensure_bucket(&self) -> Result<(), StorageError>;

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Download a batch by key and decode it into log entries.
    async fn get_object_logs(&self, key: &str) -> Result<Vec<LogEntry>, StorageError> {
        let raw = self.get_object(key).await?;
        decode_batch(&raw)
    }
}

/// Object key for a log batch, dated with the current UTC day.
pub fn key_for_batch(project_id: &str, batch_id: &str, ext: &str) -> String {
    let project = if project_id.is_empty() {
        "default"
    } else {
        project_id
    };
    format!(
        "logs/{}/{}/{}{}",
        project,
        Utc::now().format("%Y/%m/%d"),
        batch_id,
        ext
    )
}

/// Serialize entries as a JSON array and gzip the result.
pub fn encode_batch(entries: &[LogEntry]) -> Result<Vec<u8>, StorageError> {
    let json = serde_json::to_vec(entries)
        .map_err(|e| StorageError::Request(format!("encode batch: {e}")))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| StorageError::Request(format!("gzip batch: {e}")))?;
    encoder
        .finish()
        .map_err(|e| StorageError::Request(format!("gzip batch: {e}")))
}

/// Gunzip and JSON-decode a batch object.
pub fn decode_batch(raw: &[u8]) -> Result<Vec<LogEntry>, StorageError> {
    let mut decoder = GzDecoder::new(raw);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| StorageError::Corrupt(format!("gzip: {e}")))?;
    serde_json::from_slice(&json).map_err(|e| StorageError::Corrupt(format!("json: {e}")))
}
