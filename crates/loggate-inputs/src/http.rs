//! HTTP input type.
//!
//! Each http input owns a standalone listener on its own `host:port` and
//! accepts any method on any path under its base path. Every request is
//! captured twice in the buffer: a structured raw-request record (method,
//! path, query, headers, truncated body) and, when non-empty, the original
//! body bytes, so downstream consumers see both views.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use chrono::{SecondsFormat, Utc};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::model::{LogEntry, RawRequestData};
use crate::{
    ConfigField, FieldType, InputBuffer, InputConfig, InputError, InputFactory, InputTypeInfo,
    MessageInput,
};

/// Maximum body size stored in the raw-request record.
const MAX_RAW_BODY: usize = 64 * 1024;

/// Marker appended when the stored body was truncated.
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Creates HTTP ingest inputs. Registers as `http`.
pub struct HttpInputFactory;

impl InputFactory for HttpInputFactory {
    fn name(&self) -> &'static str {
        "http"
    }

    fn config_spec(&self) -> InputTypeInfo {
        InputTypeInfo {
            type_name: "http".to_string(),
            description: "HTTP ingest endpoint on its own port. Each input listens on host:port \
                          and accepts any method under its base path."
                .to_string(),
            fields: vec![
                ConfigField {
                    name: "listen".to_string(),
                    field_type: FieldType::String,
                    required: true,
                    description: "host:port to bind (e.g. :9001). Must be unique across inputs."
                        .to_string(),
                    example: Some(":9001".to_string()),
                },
                ConfigField {
                    name: "base_path".to_string(),
                    field_type: FieldType::String,
                    required: false,
                    description: "Path served on the listen port".to_string(),
                    example: Some("/ingest".to_string()),
                },
            ],
        }
    }

    fn validate_config(&self, cfg: &InputConfig) -> Result<(), InputError> {
        let listen = string_field(cfg, "listen").trim();
        if listen.is_empty() {
            return Err(InputError::InvalidConfig(
                "listen is required: each input must have its own port (e.g. :9001)".to_string(),
            ));
        }
        if !valid_listen_addr(listen) {
            return Err(InputError::InvalidConfig(
                "listen must be host:port or :port (e.g. :9001 or 0.0.0.0:9001)".to_string(),
            ));
        }
        Ok(())
    }

    fn create(
        &self,
        cfg: &InputConfig,
        buffer: Arc<dyn InputBuffer>,
    ) -> Result<Box<dyn MessageInput>, InputError> {
        let listen = string_field(cfg, "listen").trim().to_string();
        if listen.is_empty() {
            return Err(InputError::InvalidConfig(
                "listen is required for http input".to_string(),
            ));
        }
        let base_path = match string_field(cfg, "base_path") {
            "" => "/ingest",
            path => path,
        };
        Ok(Box::new(HttpInput::new(base_path, &listen, buffer)))
    }
}

fn string_field<'a>(cfg: &'a InputConfig, key: &str) -> &'a str {
    cfg.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// `host:port` with a 1-5 digit port; the host part may be empty (bind all
/// interfaces) but may not contain a colon.
fn valid_listen_addr(addr: &str) -> bool {
    match addr.split_once(':') {
        Some((_host, port)) => {
            !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Address handed to the socket bind. A listen address with an empty host
/// (`:9001`) means bind all interfaces; `ToSocketAddrs` would instead try
/// to resolve the empty host as a name and fail, so rewrite it to the
/// wildcard address up front.
fn bind_addr(listen: &str) -> String {
    match listen.split_once(':') {
        Some(("", port)) => format!("0.0.0.0:{port}"),
        _ => listen.to_string(),
    }
}

/// Exactly one leading `/`, no trailing `/`; empty normalizes to `/ingest`.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/ingest".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A running HTTP ingest endpoint.
pub struct HttpInput {
    base_path: String,
    listen_addr: String,
    buffer: Arc<dyn InputBuffer>,
    shutdown: CancellationToken,
    serve_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for HttpInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInput")
            .field("base_path", &self.base_path)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

impl HttpInput {
    pub fn new(base_path: &str, listen_addr: &str, buffer: Arc<dyn InputBuffer>) -> Self {
        Self {
            base_path: normalize_base_path(base_path),
            listen_addr: listen_addr.to_string(),
            buffer,
            shutdown: CancellationToken::new(),
            serve_handle: None,
        }
    }

    /// The normalized path served on the listen port.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn router(&self) -> Router {
        Router::new()
            .route(&self.base_path, any(ingest))
            .route(&format!("{}/{{*rest}}", self.base_path), any(ingest))
            .with_state(self.buffer.clone())
    }
}

#[async_trait]
impl MessageInput for HttpInput {
    async fn start(&mut self) -> Result<(), InputError> {
        let listener = TcpListener::bind(bind_addr(&self.listen_addr))
            .await
            .map_err(|source| InputError::Bind {
                addr: self.listen_addr.clone(),
                source,
            })?;
        tracing::info!(addr = %self.listen_addr, path = %self.base_path, "http input listening");

        let app = self.router();
        let token = self.shutdown.clone();
        let addr = self.listen_addr.clone();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(err) = serve.await {
                tracing::error!(addr = %addr, error = %err, "http input listener failed");
            }
        });
        self.serve_handle = Some(handle);
        Ok(())
    }

    async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.serve_handle.take() {
            let _ = handle.await;
        }
    }
}

fn cors_headers(origin: &str) -> [(HeaderName, HeaderValue); 3] {
    let origin =
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("*"));
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ),
    ]
}

async fn ingest(State(buffer): State<Arc<dyn InputBuffer>>, req: Request) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("*")
        .to_string();

    if req.method() == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, cors_headers(&origin)).into_response();
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, cors_headers(&origin), "read error").into_response()
        }
    };

    // Flatten headers, first value wins per name.
    let mut headers = HashMap::new();
    for (name, value) in parts.headers.iter() {
        headers
            .entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let body_str = if bytes.len() > MAX_RAW_BODY {
        let mut truncated = String::from_utf8_lossy(&bytes[..MAX_RAW_BODY]).into_owned();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let path = parts.uri.path().to_string();
    let entry = LogEntry {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        service: "ingest".to_string(),
        level: "info".to_string(),
        message: "raw http request".to_string(),
        tags: Some(HashMap::from([("path".to_string(), path.clone())])),
        raw_request: Some(RawRequestData {
            method: parts.method.to_string(),
            path,
            query: parts.uri.query().unwrap_or("").to_string(),
            headers,
            body: body_str,
        }),
        ..Default::default()
    };

    let raw_log = match serde_json::to_vec(&entry) {
        Ok(raw_log) => raw_log,
        Err(err) => {
            tracing::error!(error = %err, "serialize raw request record");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                cors_headers(&origin),
                "internal error",
            )
                .into_response();
        }
    };
    buffer.insert(raw_log.into());

    // If a body is present, also insert it as-is so already-structured log
    // payloads are still ingested.
    if !bytes.is_empty() {
        tracing::debug!(bytes = bytes.len(), path = %parts.uri.path(), "ingest payload received");
        buffer.insert(bytes);
    }

    (StatusCode::ACCEPTED, cors_headers(&origin)).into_response()
}
