//! Input management endpoints.

use axum::extract::{OriginalUri, Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::response::{created, ok};
use super::router::AppState;
use crate::controller::InputSubmission;
use crate::error::ApiError;

/// GET /inputs/types - registered input type names.
pub async fn list_types(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    let types = state.controller.registry().list_registered();
    ok(uri.path(), json!({ "types": types }), None)
}

/// GET /inputs/info - config spec for every registered input type.
pub async fn all_types_info(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let types = state.controller.registry().all_types_info();
    ok(uri.path(), json!({ "types": types }), None)
}

/// GET /inputs/types/{type} - config spec for one input type.
pub async fn get_type_info(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(type_name): Path<String>,
) -> Result<Response, ApiError> {
    match state.controller.registry().type_info(&type_name) {
        Some(info) => Ok(ok(uri.path(), info, None)),
        None => Err(ApiError::not_found(
            uri.path(),
            "unknown input type",
            format!("unknown input type: {type_name}"),
        )),
    }
}

/// GET /inputs - all persisted inputs.
pub async fn list_inputs(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let inputs = state
        .controller
        .list()
        .await
        .map_err(|err| ApiError::from_controller(uri.path(), err))?;
    Ok(ok(uri.path(), json!({ "inputs": inputs }), None))
}

/// POST /inputs - create an input, persist it, and start it.
pub async fn create_input(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(req): Json<InputSubmission>,
) -> Result<Response, ApiError> {
    let view = state
        .controller
        .create(req)
        .await
        .map_err(|err| ApiError::from_controller(uri.path(), err))?;
    Ok(created(uri.path(), view, Some("input created")))
}

/// PUT /inputs/{id} - update an input: stop, persist, restart.
pub async fn update_input(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    Json(req): Json<InputSubmission>,
) -> Result<Response, ApiError> {
    let id = parse_id(uri.path(), &id)?;
    let view = state
        .controller
        .update(id, req)
        .await
        .map_err(|err| ApiError::from_controller(uri.path(), err))?;
    Ok(ok(uri.path(), view, Some("input updated")))
}

/// DELETE /inputs/{id} - stop and delete an input.
pub async fn delete_input(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(uri.path(), &id)?;
    state
        .controller
        .delete(id)
        .await
        .map_err(|err| ApiError::from_controller(uri.path(), err))?;
    Ok(ok(uri.path(), serde_json::Value::Null, Some("input deleted")))
}

fn parse_id(path: &str, raw: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::bad_request(path, "invalid id", format!("invalid input id: {raw}")))
}
