//! Uploaded batch inspection endpoints.

use std::collections::HashMap;

use axum::extract::{OriginalUri, Query, State};
use axum::response::Response;
use serde_json::json;

use super::response::ok;
use super::router::AppState;
use crate::error::ApiError;

/// GET /uploads?prefix=logs/ - list batch objects.
pub async fn list_uploads(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let store = match &state.object_store {
        Some(store) => store,
        None => {
            return Ok(ok(
                uri.path(),
                json!({ "objects": [] }),
                Some("object store not configured"),
            ))
        }
    };
    let prefix = params
        .get("prefix")
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .unwrap_or("logs/");
    let objects = store
        .list_objects(prefix)
        .await
        .map_err(|err| ApiError::internal(uri.path(), "list uploads failed", err.to_string()))?;
    Ok(ok(uri.path(), json!({ "objects": objects }), None))
}

/// GET /uploads/content?key=K - fetch and decode one batch object.
pub async fn upload_content(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let store = state.object_store.as_ref().ok_or_else(|| {
        ApiError::bad_request(
            uri.path(),
            "object store not configured",
            "object store not configured",
        )
    })?;
    let key = params
        .get("key")
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request(uri.path(), "missing key", "query param key is required")
        })?;
    let logs = store.get_object_logs(key).await.map_err(|err| {
        ApiError::internal(uri.path(), "get upload content failed", err.to_string())
    })?;
    Ok(ok(uri.path(), json!({ "logs": logs, "key": key }), None))
}
