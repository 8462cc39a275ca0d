//! Gateway configuration, loaded from the environment.
//!
//! All variables share the `LOGGATE_` prefix. The database URL, management
//! port, and CORS allow-list are required; the object store block is
//! optional but all-or-nothing — endpoint, bucket, and both keys must be
//! set together to enable the batcher.

use std::env;
use std::time::Duration;

use loggate_telemetry::LogFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(
        "incomplete object store configuration: LOGGATE_S3_ENDPOINT, LOGGATE_S3_BUCKET, \
         LOGGATE_S3_ACCESS_KEY and LOGGATE_S3_SECRET_KEY must be set together"
    )]
    PartialObjectStore,
}

/// Top-level gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub object_store: Option<ObjectStoreConfig>,
    pub batcher: BatcherSettings,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Management API port.
    pub port: u16,
    /// Allowed CORS origins for the management API; `*` allows any.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

/// S3-compatible object store connection settings.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct BatcherSettings {
    pub max_batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            flush_interval: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_raw = required_var("LOGGATE_SERVER_PORT")?;
        let port = port_raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            var: "LOGGATE_SERVER_PORT",
            reason: e.to_string(),
        })?;

        let origins = parse_origins(&required_var("LOGGATE_CORS_ALLOWED_ORIGINS")?);
        if origins.is_empty() {
            return Err(ConfigError::Invalid {
                var: "LOGGATE_CORS_ALLOWED_ORIGINS",
                reason: "at least one origin (or *) is required".to_string(),
            });
        }

        let max_connections = match optional_var("LOGGATE_DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: "LOGGATE_DATABASE_MAX_CONNECTIONS",
                reason: e.to_string(),
            })?,
            None => 5,
        };

        let log_level = optional_var("LOGGATE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = match optional_var("LOGGATE_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "LOGGATE_LOG_FORMAT",
                reason: format!("expected json or pretty, got {raw:?}"),
            })?,
            None => LogFormat::Json,
        };

        let mut batcher = BatcherSettings::default();
        if let Some(raw) = optional_var("LOGGATE_BATCHER_MAX_BATCH_SIZE") {
            let size = raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: "LOGGATE_BATCHER_MAX_BATCH_SIZE",
                reason: e.to_string(),
            })?;
            if size == 0 {
                return Err(ConfigError::Invalid {
                    var: "LOGGATE_BATCHER_MAX_BATCH_SIZE",
                    reason: "must be greater than zero".to_string(),
                });
            }
            batcher.max_batch_size = size;
        }
        if let Some(raw) = optional_var("LOGGATE_BATCHER_FLUSH_INTERVAL") {
            batcher.flush_interval =
                parse_duration(&raw).map_err(|reason| ConfigError::Invalid {
                    var: "LOGGATE_BATCHER_FLUSH_INTERVAL",
                    reason,
                })?;
        }

        Ok(Self {
            server: ServerConfig {
                port,
                cors_allowed_origins: origins,
            },
            database: DatabaseConfig {
                url: required_var("LOGGATE_DATABASE_URL")?,
                max_connections,
            },
            log: LogConfig {
                level: log_level,
                format: log_format,
            },
            object_store: object_store_from_env()?,
            batcher,
        })
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match optional_var(name) {
        Some(value) => Ok(value),
        None => Err(ConfigError::MissingVar(name)),
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn object_store_from_env() -> Result<Option<ObjectStoreConfig>, ConfigError> {
    let endpoint = optional_var("LOGGATE_S3_ENDPOINT");
    let bucket = optional_var("LOGGATE_S3_BUCKET");
    let access_key = optional_var("LOGGATE_S3_ACCESS_KEY");
    let secret_key = optional_var("LOGGATE_S3_SECRET_KEY");

    match (endpoint, bucket, access_key, secret_key) {
        (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key)) => {
            Ok(Some(ObjectStoreConfig {
                endpoint,
                bucket,
                region: optional_var("LOGGATE_S3_REGION")
                    .unwrap_or_else(|| "us-east-1".to_string()),
                access_key,
                secret_key,
            }))
        }
        (None, None, None, None) => Ok(None),
        _ => Err(ConfigError::PartialObjectStore),
    }
}

/// Split a comma-separated origin list, dropping empty segments.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a duration string such as `30s`, `500ms`, `5m`, or `1h`.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (number, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => return Err(format!("missing unit in {raw:?} (expected e.g. 30s)")),
    };
    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid number in {raw:?}"))?;
    if value == 0 {
        return Err(format!("duration {raw:?} must be greater than zero"));
    }
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 3600)),
        _ => Err(format!("unknown duration unit {unit:?} in {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 10s ").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("ten seconds").is_err());
    }

    #[test]
    fn parse_origins_splits_and_trims() {
        assert_eq!(
            parse_origins("http://a.example, http://b.example ,"),
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
        assert!(parse_origins("  ,  ").is_empty());
    }

    #[test]
    fn batcher_settings_defaults() {
        let defaults = BatcherSettings::default();
        assert_eq!(defaults.max_batch_size, 1000);
        assert_eq!(defaults.flush_interval, Duration::from_secs(30));
    }
}
