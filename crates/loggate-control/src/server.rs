//! Gateway wiring: database, batcher, controller, and the management API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use loggate_inputs::http::HttpInputFactory;
use loggate_inputs::{InputBuffer, Registry};
use loggate_telemetry::events;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::batcher::{Batcher, BatcherConfig};
use crate::config::Config;
use crate::controller::InputController;
use crate::db::{self, InputsRepository};
use crate::recent::{RecentLogsRing, StatusStore, DEFAULT_RECENT_CAPACITY};
use crate::storage::{ObjectStore, S3ObjectStore};

/// Fallback sink when no object store is configured: payloads accumulate in
/// memory and are never uploaded, but ingest endpoints stay functional.
#[derive(Default)]
struct MemoryBuffer {
    payloads: Mutex<Vec<Bytes>>,
}

impl InputBuffer for MemoryBuffer {
    fn insert(&self, payload: Bytes) {
        self.payloads.lock().expect("lock poisoned").push(payload);
    }
}

/// Run the gateway. Blocks until SIGTERM/Ctrl-C, then stops the inputs and
/// drains the batcher before returning.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let recent = Arc::new(RecentLogsRing::new(DEFAULT_RECENT_CAPACITY));

    let registry = Arc::new(Registry::new());
    registry.register(Arc::new(HttpInputFactory));
    tracing::info!(
        event = events::STARTUP,
        types = ?registry.list_registered(),
        "registered input types"
    );

    // With an object store configured the batcher is the shared buffer;
    // otherwise fall back to a plain in-memory sink.
    let (buffer, status, batcher, object_store): (
        Arc<dyn InputBuffer>,
        Arc<StatusStore>,
        Option<Arc<Batcher>>,
        Option<Arc<dyn ObjectStore>>,
    ) = match &config.object_store {
        Some(store_config) => {
            let store: Arc<dyn ObjectStore> =
                Arc::new(S3ObjectStore::connect(store_config).await);
            if let Err(err) = store.ensure_bucket().await {
                tracing::warn!(error = %err, bucket = %store_config.bucket, "ensure bucket failed; uploads may fail");
            }
            let status = Arc::new(StatusStore::new(true));
            let batcher = Arc::new(Batcher::new(
                BatcherConfig {
                    max_batch_size: config.batcher.max_batch_size,
                    flush_interval: config.batcher.flush_interval,
                    ..Default::default()
                },
                store.clone(),
                recent.clone(),
                status.clone(),
            ));
            batcher.start();
            tracing::info!(
                batch = config.batcher.max_batch_size,
                interval = ?config.batcher.flush_interval,
                "batcher enabled"
            );
            (batcher.clone(), status, Some(batcher), Some(store))
        }
        None => {
            tracing::info!("object store not configured; buffering in memory only");
            (
                Arc::new(MemoryBuffer::default()),
                Arc::new(StatusStore::new(false)),
                None,
                None,
            )
        }
    };

    let store = Arc::new(InputsRepository::new(pool.clone()));
    let controller = Arc::new(InputController::new(registry, store, buffer));
    controller.restore().await;

    let state = AppState {
        pool,
        controller: controller.clone(),
        recent,
        status,
        object_store,
    };
    let app = api::create_router(state, &config.server.cors_allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(event = events::LISTENING, addr = %addr, "management api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(event = events::SHUTDOWN, "shutting down");
    controller.stop_all().await;
    if let Some(batcher) = batcher {
        // Final drain so buffered entries are not lost on a clean exit.
        batcher.stop().await;
    }
    Ok(())
}

/// Resolves on SIGTERM (Unix) or Ctrl-C.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("received SIGTERM, shutting down..."),
    }
}
