//! Axum router configuration.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{health, inputs, logs, uploads};
use crate::controller::InputController;
use crate::recent::{RecentLogsRing, StatusStore};
use crate::storage::ObjectStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub controller: Arc<InputController>,
    pub recent: Arc<RecentLogsRing>,
    pub status: Arc<StatusStore>,
    /// `None` when the object store is not configured.
    pub object_store: Option<Arc<dyn ObjectStore>>,
}

/// Create the API router with all routes.
pub fn create_router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Input types
        .route("/inputs/types", get(inputs::list_types))
        .route("/inputs/types/{type}", get(inputs::get_type_info))
        .route("/inputs/info", get(inputs::all_types_info))
        // Input CRUD
        .route(
            "/inputs",
            get(inputs::list_inputs).post(inputs::create_input),
        )
        .route(
            "/inputs/{id}",
            axum::routing::put(inputs::update_input).delete(inputs::delete_input),
        )
        // Observation
        .route("/logs/recent", get(logs::recent_logs))
        .route("/logs/status", get(logs::upload_status))
        .route("/uploads", get(uploads::list_uploads))
        .route("/uploads/content", get(uploads::upload_content))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(values)
        .allow_methods(Any)
        .allow_headers(Any)
}
