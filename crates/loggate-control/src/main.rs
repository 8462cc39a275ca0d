//! Loggate gateway binary.
//!
//! Multi-tenant log ingestion gateway: operator-defined inputs each own a
//! network listener, feed a shared buffer, and a background batcher
//! persists gzip JSON batches to an S3-compatible object store.

mod api;
mod batcher;
mod config;
mod controller;
mod db;
mod error;
mod recent;
mod server;
mod storage;

use loggate_telemetry::TelemetryConfig;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let telemetry = TelemetryConfig::new()
        .with_service_name("loggate")
        .with_log_level(config.log.level.as_str())
        .with_log_format(config.log.format);
    loggate_telemetry::init_logging(&telemetry)?;

    server::run(config).await
}
