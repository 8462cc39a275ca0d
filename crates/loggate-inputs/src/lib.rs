//! Input plumbing for the loggate gateway.
//!
//! An *input* is a runtime-defined log source. Each input type ships an
//! [`InputFactory`] that declares its configuration schema, validates
//! configuration maps, and builds runnable [`MessageInput`] instances bound
//! to the shared [`InputBuffer`]. The [`Registry`] maps type names to
//! factories so the control plane can create inputs dynamically.

pub mod http;
pub mod model;

mod registry;
mod typeinfo;

pub use registry::Registry;
pub use typeinfo::{ConfigField, FieldType, InputTypeInfo};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Key-value map for input-type-specific configuration.
///
/// The control plane passes it when creating an input; factories interpret
/// it. Stored as-is in the `configuration` column of the inputs table.
pub type InputConfig = serde_json::Map<String, serde_json::Value>;

/// Errors raised by factories and running inputs.
#[derive(Debug, Error)]
pub enum InputError {
    /// No factory is registered under the requested type name.
    #[error("unknown input type: {0}")]
    UnknownType(String),

    /// The configuration map failed the factory's validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The instance could not bind its listen address.
    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sink that receives raw log payloads from running inputs.
///
/// Producers are the input listeners; the batcher is the sole consumer.
/// `insert` must not block request handling.
pub trait InputBuffer: Send + Sync {
    /// Hand one raw payload to the ingestion pipeline.
    fn insert(&self, payload: Bytes);
}

/// A running input instance.
///
/// `start` binds the underlying listener and returns once it is accepting
/// (or with the bind failure); serving continues in a background task.
/// `stop` releases the listener on every exit path and is idempotent.
#[async_trait]
pub trait MessageInput: Send + std::fmt::Debug {
    async fn start(&mut self) -> Result<(), InputError>;
    async fn stop(&mut self);
}

/// Builds [`MessageInput`] instances for one input type.
///
/// Each input type (http, and future ones) implements a factory and
/// registers it with the [`Registry`]. `config_spec` declares which
/// configuration fields the type expects so callers can validate or build
/// UIs without creating an instance.
pub trait InputFactory: Send + Sync {
    /// Self-declared type name used as the registry key.
    fn name(&self) -> &'static str;

    /// Declarative configuration schema for this type.
    fn config_spec(&self) -> InputTypeInfo;

    /// Validate a configuration map without constructing an instance.
    fn validate_config(&self, cfg: &InputConfig) -> Result<(), InputError>;

    /// Build an instance bound to the given buffer.
    fn create(
        &self,
        cfg: &InputConfig,
        buffer: Arc<dyn InputBuffer>,
    ) -> Result<Box<dyn MessageInput>, InputError>;
}
