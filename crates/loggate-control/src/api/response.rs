//! Success response envelope.
//!
//! All successful responses share `{data, status, message?, path}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    data: T,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    path: String,
}

fn envelope<T: Serialize>(
    status: StatusCode,
    path: &str,
    data: T,
    message: Option<&str>,
) -> Response {
    let body = ApiResponse {
        data,
        status: status.as_u16(),
        message: message.map(str::to_string),
        path: path.to_string(),
    };
    (status, Json(body)).into_response()
}

/// 200 response with data.
pub fn ok<T: Serialize>(path: &str, data: T, message: Option<&str>) -> Response {
    envelope(StatusCode::OK, path, data, message)
}

/// 201 response with data.
pub fn created<T: Serialize>(path: &str, data: T, message: Option<&str>) -> Response {
    envelope(StatusCode::CREATED, path, data, message)
}
