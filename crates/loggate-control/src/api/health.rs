//! Health check endpoint.

use axum::extract::{OriginalUri, State};
use axum::response::Response;
use serde_json::json;

use super::response::ok;
use super::router::AppState;
use crate::error::ApiError;

/// GET /health
pub async fn health_check(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    // Verify database connectivity
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|err| ApiError::internal(uri.path(), "database unreachable", err.to_string()))?;

    Ok(ok(
        uri.path(),
        json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }),
        None,
    ))
}
