//! Management API error responses.
//!
//! All errors share `{message, error, path, status}` and translate the
//! controller taxonomy to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::controller::ControllerError;

/// Standard error response shape.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub message: String,
    pub error: String,
    pub path: String,
    pub status: u16,
}

impl ApiError {
    fn new(status: StatusCode, path: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: error.into(),
            path: path.to_string(),
            status: status.as_u16(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(path: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, path, message, error)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(path: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, path, message, error)
    }

    /// Create a 409 Conflict error.
    pub fn conflict(path: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, path, message, error)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(path: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, path, message, error)
    }

    /// Translate a controller error to its HTTP representation.
    pub fn from_controller(path: &str, err: ControllerError) -> Self {
        match err {
            ControllerError::BadRequest(detail) => {
                Self::bad_request(path, "invalid request", detail)
            }
            ControllerError::NotFound => Self::not_found(path, "input not found", "input not found"),
            ControllerError::Conflict(detail) => {
                Self::conflict(path, "listen address already in use", detail)
            }
            ControllerError::Internal(detail) => Self::internal(path, "internal error", detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Json(&self).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_errors_map_to_status_codes() {
        let cases = [
            (ControllerError::BadRequest("x".to_string()), 400),
            (ControllerError::NotFound, 404),
            (ControllerError::Conflict("x".to_string()), 409),
            (ControllerError::Internal("x".to_string()), 500),
        ];
        for (err, status) in cases {
            let api = ApiError::from_controller("/inputs", err);
            assert_eq!(api.status, status);
            assert_eq!(api.path, "/inputs");
        }
    }
}
