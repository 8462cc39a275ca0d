//! Wire model for ingested log entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Full HTTP request details captured for raw ingest logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRequestData {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// The validated structure for an ingested log.
///
/// Ingest payloads should be JSON objects with these fields; `service`,
/// `level`, and `message` are required for a record to count as
/// well-formed. Every field defaults on deserialization so the batcher can
/// inspect partially-formed payloads without failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 or Unix ms; accepted as opaque.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub service: String,
    /// e.g. debug, info, warn, error; values are free-form.
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    /// Optional; for multi-tenant routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Present when the entry was synthesized from a raw HTTP request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_request: Option<RawRequestData>,
}

impl LogEntry {
    /// Whether the required fields are all present and non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.service.is_empty() && !self.level.is_empty() && !self.message.is_empty()
    }
}
