//! Recent logs and flush status endpoints.

use axum::extract::{OriginalUri, State};
use axum::response::Response;
use serde_json::json;

use super::response::ok;
use super::router::AppState;

/// GET /logs/recent - snapshot of the recent logs ring.
pub async fn recent_logs(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    ok(uri.path(), json!({ "logs": state.recent.get_recent() }), None)
}

/// GET /logs/status - batcher flush status.
pub async fn upload_status(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    ok(uri.path(), state.status.snapshot(), None)
}
