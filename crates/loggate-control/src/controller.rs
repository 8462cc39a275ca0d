//! Input controller: CRUD over input definitions with runtime side effects.
//!
//! The controller owns the instance map and every mutation of persisted
//! input rows. One mutex guards the map *and* the port-uniqueness decision;
//! it is held across the store write so two parallel creates on the same
//! port cannot both succeed.

use std::collections::HashMap;
use std::sync::Arc;

use loggate_inputs::{InputBuffer, InputConfig, MessageInput, Registry};
use loggate_telemetry::events;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{InputRecord, InputState, InputStore, InputUpdate, NewInput};

/// Error taxonomy surfaced to the management API.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("input not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<sqlx::Error> for ControllerError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSubmission {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    /// Convenience field, folded into `configuration.description`.
    #[serde(default)]
    pub description: String,
    /// Convenience field, folded into `configuration.listen`.
    #[serde(default)]
    pub listen: String,
    #[serde(default)]
    pub config: Option<InputConfig>,
}

/// API view of a persisted input.
#[derive(Debug, Clone, Serialize)]
pub struct InputView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub configuration: serde_json::Value,
    pub created_at: String,
    pub state: String,
}

/// A persisted input and its running instance.
struct InstanceRecord {
    input: InputRecord,
    run: Box<dyn MessageInput>,
}

pub struct InputController {
    registry: Arc<Registry>,
    store: Arc<dyn InputStore>,
    buffer: Arc<dyn InputBuffer>,
    instances: Mutex<HashMap<Uuid, InstanceRecord>>,
}

impl InputController {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn InputStore>,
        buffer: Arc<dyn InputBuffer>,
    ) -> Self {
        Self {
            registry,
            store,
            buffer,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All persisted inputs; state reports `RUNNING` whenever a live
    /// instance exists, otherwise the persisted desired state.
    pub async fn list(&self) -> Result<Vec<InputView>, ControllerError> {
        let records = self.store.list().await?;
        let instances = self.instances.lock().await;
        Ok(records
            .into_iter()
            .map(|record| {
                let live = instances.contains_key(&record.id);
                view(&record, live)
            })
            .collect())
    }

    /// Validate, persist, build, and start a new input.
    pub async fn create(&self, req: InputSubmission) -> Result<InputView, ControllerError> {
        if req.kind.is_empty() {
            return Err(ControllerError::BadRequest("missing type".to_string()));
        }

        let id = Uuid::new_v4();
        let title = if req.title.is_empty() {
            format!("input-{}", &id.to_string()[..8])
        } else {
            req.title.clone()
        };

        let cfg = merge_config(req.config.clone().unwrap_or_default(), &req);
        if req.kind == "http" && !cfg.contains_key("listen") {
            return Err(ControllerError::BadRequest(
                "listen is required: http inputs bind their own port (e.g. :9001)".to_string(),
            ));
        }

        self.registry
            .validate_config(&req.kind, &cfg)
            .map_err(|err| ControllerError::BadRequest(err.to_string()))?;

        // Hold the instance lock across the uniqueness decision and the
        // store write so concurrent creates on the same port serialize.
        let mut instances = self.instances.lock().await;

        if req.kind == "http" {
            self.check_listen_conflict(&cfg, None).await?;
        }

        let record = self
            .store
            .create(NewInput {
                id: Some(id),
                kind: req.kind.clone(),
                title,
                configuration: serde_json::Value::Object(cfg.clone()),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await?;

        // On factory or start failure the row stays behind; restore retries
        // it on the next boot.
        let mut run = self
            .registry
            .create(&req.kind, &cfg, self.buffer.clone())
            .map_err(|err| ControllerError::BadRequest(err.to_string()))?;
        run.start()
            .await
            .map_err(|err| ControllerError::Internal(err.to_string()))?;

        let result = view(&record, true);
        instances.insert(record.id, InstanceRecord { input: record, run });
        Ok(result)
    }

    /// Stop the running instance, apply the merged update, then build and
    /// start a fresh instance. The type of an input is immutable.
    pub async fn update(
        &self,
        id: Uuid,
        req: InputSubmission,
    ) -> Result<InputView, ControllerError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(ControllerError::NotFound)?;

        let mut instances = self.instances.lock().await;

        // Release the port first so the new configuration, possibly on the
        // same port, can rebind.
        if let Some(mut existing) = instances.remove(&id) {
            existing.run.stop().await;
        }

        let title = if req.title.is_empty() {
            record.title.clone()
        } else {
            req.title.clone()
        };

        let mut cfg = match &record.configuration {
            serde_json::Value::Object(map) => map.clone(),
            _ => InputConfig::new(),
        };
        if let Some(overrides) = &req.config {
            for (key, value) in overrides {
                cfg.insert(key.clone(), value.clone());
            }
        }
        let cfg = merge_config(cfg, &req);

        self.registry
            .validate_config(&record.kind, &cfg)
            .map_err(|err| ControllerError::BadRequest(err.to_string()))?;

        if record.kind == "http" {
            self.check_listen_conflict(&cfg, Some(id)).await?;
        }

        let updated = self
            .store
            .update(
                id,
                InputUpdate {
                    kind: record.kind.clone(),
                    title,
                    configuration: serde_json::Value::Object(cfg.clone()),
                    desired_state: InputState::Running,
                },
            )
            .await?
            .ok_or(ControllerError::NotFound)?;

        let mut run = self
            .registry
            .create(&updated.kind, &cfg, self.buffer.clone())
            .map_err(|err| ControllerError::BadRequest(err.to_string()))?;
        run.start()
            .await
            .map_err(|err| ControllerError::Internal(err.to_string()))?;

        let result = view(&updated, true);
        instances.insert(updated.id, InstanceRecord { input: updated, run });
        Ok(result)
    }

    /// Stop the instance if running and delete the row.
    pub async fn delete(&self, id: Uuid) -> Result<(), ControllerError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(ControllerError::NotFound)?;

        let mut instances = self.instances.lock().await;
        if let Some(mut existing) = instances.remove(&id) {
            existing.run.stop().await;
        }

        self.store.delete(id).await?;
        Ok(())
    }

    /// Start every persisted http input that has a listen address.
    /// Per-row failures are logged and skipped.
    pub async fn restore(&self) {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = %err, "restore: list inputs failed");
                return;
            }
        };

        for record in records {
            if record.kind != "http" {
                tracing::debug!(title = %record.title, kind = %record.kind, "restore: skipping non-http input");
                continue;
            }
            let mut cfg = match &record.configuration {
                serde_json::Value::Object(map) => map.clone(),
                _ => InputConfig::new(),
            };
            if !cfg.contains_key("listen") {
                tracing::warn!(title = %record.title, "restore: skipping input without listen address");
                continue;
            }
            cfg.entry("base_path".to_string())
                .or_insert_with(|| serde_json::json!("/ingest"));

            let mut run = match self.registry.create(&record.kind, &cfg, self.buffer.clone()) {
                Ok(run) => run,
                Err(err) => {
                    tracing::warn!(title = %record.title, error = %err, "restore: create failed");
                    continue;
                }
            };
            if let Err(err) = run.start().await {
                tracing::warn!(title = %record.title, error = %err, "restore: start failed");
                continue;
            }

            tracing::info!(
                event = events::INPUT_RESTORED,
                title = %record.title,
                listen = %cfg.get("listen").and_then(|v| v.as_str()).unwrap_or(""),
                "restored input"
            );
            let mut instances = self.instances.lock().await;
            instances.insert(record.id, InstanceRecord { input: record, run });
        }
    }

    /// Stop every running instance. Used during process shutdown.
    pub async fn stop_all(&self) {
        let mut instances = self.instances.lock().await;
        for (_, mut record) in instances.drain() {
            record.run.stop().await;
        }
    }

    /// Fail with `Conflict` when another http row claims the same listen
    /// address. Uniqueness is a string comparison, so `:9001` and
    /// `0.0.0.0:9001` are distinct keys.
    async fn check_listen_conflict(
        &self,
        cfg: &InputConfig,
        exclude: Option<Uuid>,
    ) -> Result<(), ControllerError> {
        let listen = match cfg.get("listen").and_then(|v| v.as_str()) {
            Some(listen) if !listen.is_empty() => listen,
            _ => return Ok(()),
        };
        let existing = self.store.list().await?;
        for other in existing {
            if Some(other.id) == exclude || other.kind != "http" {
                continue;
            }
            let other_listen = other
                .configuration
                .get("listen")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if !other_listen.is_empty() && other_listen == listen {
                return Err(ControllerError::Conflict(format!(
                    "listen {listen} is already used by another input"
                )));
            }
        }
        Ok(())
    }
}

/// Fold the convenience fields into the configuration map and default the
/// base path.
fn merge_config(mut cfg: InputConfig, req: &InputSubmission) -> InputConfig {
    if !req.description.is_empty() {
        cfg.insert(
            "description".to_string(),
            serde_json::json!(req.description),
        );
    }
    if !req.listen.is_empty() {
        cfg.insert("listen".to_string(), serde_json::json!(req.listen));
    }
    cfg.entry("base_path".to_string())
        .or_insert_with(|| serde_json::json!("/ingest"));
    cfg
}

fn view(record: &InputRecord, live: bool) -> InputView {
    let state = if live {
        InputState::Running.as_str().to_string()
    } else {
        record.desired_state().as_str().to_string()
    };
    InputView {
        id: record.id,
        kind: record.kind.clone(),
        title: record.title.clone(),
        configuration: record.configuration.clone(),
        created_at: record.created_at.to_rfc3339(),
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use loggate_inputs::http::HttpInputFactory;
    use std::sync::Mutex as StdMutex;

    struct NullBuffer;

    impl InputBuffer for NullBuffer {
        fn insert(&self, _payload: Bytes) {}
    }

    /// In-memory stand-in for the Postgres repository.
    #[derive(Default)]
    struct MemoryStore {
        rows: StdMutex<Vec<InputRecord>>,
    }

    #[async_trait::async_trait]
    impl InputStore for MemoryStore {
        async fn create(&self, input: NewInput) -> Result<InputRecord, sqlx::Error> {
            let record = InputRecord {
                id: input.id.unwrap_or_else(Uuid::new_v4),
                kind: input.kind,
                title: input.title,
                configuration: input.configuration,
                global: input.global,
                node_id: input.node_id,
                creator_user_id: input.creator_user_id,
                created_at: Utc::now(),
                desired_state: input.desired_state.as_str().to_string(),
            };
            self.rows.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn list(&self) -> Result<Vec<InputRecord>, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<InputRecord>, sqlx::Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn update(
            &self,
            id: Uuid,
            update: InputUpdate,
        ) -> Result<Option<InputRecord>, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.id == id) {
                Some(row) => {
                    row.kind = update.kind;
                    row.title = update.title;
                    row.configuration = update.configuration;
                    row.desired_state = update.desired_state.as_str().to_string();
                    Ok(Some(row.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() < before)
        }
    }

    fn controller() -> (InputController, Arc<MemoryStore>) {
        let registry = Arc::new(Registry::new());
        registry.register(Arc::new(HttpInputFactory));
        let store = Arc::new(MemoryStore::default());
        let controller = InputController::new(
            registry,
            store.clone() as Arc<dyn InputStore>,
            Arc::new(NullBuffer),
        );
        (controller, store)
    }

    fn http_submission(listen: &str) -> InputSubmission {
        InputSubmission {
            kind: "http".to_string(),
            listen: listen.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_title_and_state() {
        let (controller, _) = controller();
        let created = controller
            .create(http_submission("127.0.0.1:19711"))
            .await
            .expect("create");

        assert_eq!(created.kind, "http");
        assert_eq!(created.state, "RUNNING");
        assert!(created.title.starts_with("input-"));
        assert_eq!(created.title.len(), "input-".len() + 8);
        assert_eq!(
            created.configuration.get("base_path").and_then(|v| v.as_str()),
            Some("/ingest")
        );

        controller.delete(created.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn create_accepts_empty_host_listen() {
        let (controller, _) = controller();
        let created = controller
            .create(http_submission(":19725"))
            .await
            .expect("empty-host listen must bind the wildcard address");

        assert_eq!(created.state, "RUNNING");
        // The listener is reachable via loopback.
        let conn = tokio::net::TcpStream::connect("127.0.0.1:19725").await;
        assert!(conn.is_ok());
        drop(conn);

        controller.delete(created.id).await.expect("cleanup");
        let rebind = tokio::net::TcpListener::bind("0.0.0.0:19725").await;
        assert!(rebind.is_ok());
    }

    #[tokio::test]
    async fn create_rejects_missing_type() {
        let (controller, _) = controller();
        let err = controller
            .create(InputSubmission::default())
            .await
            .expect_err("missing type must fail");
        assert!(matches!(err, ControllerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_http_without_listen() {
        let (controller, _) = controller();
        let err = controller
            .create(InputSubmission {
                kind: "http".to_string(),
                ..Default::default()
            })
            .await
            .expect_err("missing listen must fail");
        assert!(matches!(err, ControllerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_malformed_listen() {
        let (controller, _) = controller();
        let err = controller
            .create(http_submission("not-an-address"))
            .await
            .expect_err("malformed listen must fail");
        assert!(matches!(err, ControllerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_type() {
        let (controller, _) = controller();
        let err = controller
            .create(InputSubmission {
                kind: "syslog".to_string(),
                ..Default::default()
            })
            .await
            .expect_err("unknown type must fail");
        assert!(matches!(err, ControllerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_listen_conflicts() {
        let (controller, _) = controller();
        let first = controller
            .create(http_submission("127.0.0.1:19712"))
            .await
            .expect("first create");

        let err = controller
            .create(http_submission("127.0.0.1:19712"))
            .await
            .expect_err("duplicate listen must conflict");
        assert!(matches!(err, ControllerError::Conflict(_)));

        controller.delete(first.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn listen_uniqueness_is_a_string_comparison() {
        // "0.0.0.0:19713" and "127.0.0.1:19713" cover the same port but are
        // different strings: the uniqueness check admits the second row and
        // the failure only surfaces at bind time.
        let (controller, _) = controller();
        let first = controller
            .create(http_submission("0.0.0.0:19713"))
            .await
            .expect("first create");

        let err = controller
            .create(http_submission("127.0.0.1:19713"))
            .await
            .expect_err("same port under a different string fails at bind");
        assert!(matches!(err, ControllerError::Internal(_)));

        controller.delete(first.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn create_leaves_row_behind_when_start_fails() {
        let (controller, store) = controller();
        // Occupy the port so start() fails after the row is persisted.
        let blocker = tokio::net::TcpListener::bind("127.0.0.1:19714")
            .await
            .expect("bind blocker");

        let err = controller
            .create(http_submission("127.0.0.1:19714"))
            .await
            .expect_err("start must fail");
        assert!(matches!(err, ControllerError::Internal(_)));

        // Orphaned row remains for restore to retry.
        let rows = store.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].desired_state, "RUNNING");
        drop(blocker);
    }

    #[tokio::test]
    async fn update_relocates_port_and_preserves_identity() {
        let (controller, store) = controller();
        let created = controller
            .create(http_submission("127.0.0.1:19715"))
            .await
            .expect("create");

        let updated = controller
            .update(created.id, http_submission("127.0.0.1:19716"))
            .await
            .expect("update");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(
            updated.configuration.get("listen").and_then(|v| v.as_str()),
            Some("127.0.0.1:19716")
        );

        // Old port is free again.
        let rebind = tokio::net::TcpListener::bind("127.0.0.1:19715").await;
        assert!(rebind.is_ok());
        drop(rebind);

        let row = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(
            row.configuration.get("listen").and_then(|v| v.as_str()),
            Some("127.0.0.1:19716")
        );

        controller.delete(created.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn update_can_rebind_the_same_port() {
        let (controller, _) = controller();
        let created = controller
            .create(http_submission("127.0.0.1:19717"))
            .await
            .expect("create");

        // Same listen address: the old instance is stopped before the new
        // one binds, so this succeeds.
        let updated = controller
            .update(created.id, http_submission("127.0.0.1:19717"))
            .await
            .expect("update on same port");
        assert_eq!(updated.id, created.id);

        controller.delete(created.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn update_merges_configuration() {
        let (controller, _) = controller();
        let mut config = InputConfig::new();
        config.insert("base_path".to_string(), serde_json::json!("/custom"));
        let created = controller
            .create(InputSubmission {
                kind: "http".to_string(),
                listen: "127.0.0.1:19718".to_string(),
                config: Some(config),
                ..Default::default()
            })
            .await
            .expect("create");

        // Update only the description; base_path and listen are retained.
        let updated = controller
            .update(
                created.id,
                InputSubmission {
                    description: "app logs".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(
            updated.configuration.get("base_path").and_then(|v| v.as_str()),
            Some("/custom")
        );
        assert_eq!(
            updated.configuration.get("listen").and_then(|v| v.as_str()),
            Some("127.0.0.1:19718")
        );
        assert_eq!(
            updated
                .configuration
                .get("description")
                .and_then(|v| v.as_str()),
            Some("app logs")
        );

        controller.delete(created.id).await.expect("cleanup");
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (controller, _) = controller();
        let err = controller
            .update(Uuid::new_v4(), http_submission(":19719"))
            .await
            .expect_err("unknown id");
        assert!(matches!(err, ControllerError::NotFound));
    }

    #[tokio::test]
    async fn delete_stops_instance_and_frees_port() {
        let (controller, store) = controller();
        let created = controller
            .create(http_submission("127.0.0.1:19720"))
            .await
            .expect("create");

        controller.delete(created.id).await.expect("delete");

        assert!(store.get_by_id(created.id).await.unwrap().is_none());
        let rebind = tokio::net::TcpListener::bind("127.0.0.1:19720").await;
        assert!(rebind.is_ok());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let (controller, _) = controller();
        let err = controller
            .delete(Uuid::new_v4())
            .await
            .expect_err("unknown id");
        assert!(matches!(err, ControllerError::NotFound));
    }

    #[tokio::test]
    async fn restore_starts_rows_with_listen_and_skips_the_rest() {
        let (controller, store) = controller();

        store
            .create(NewInput {
                id: None,
                kind: "http".to_string(),
                title: "with-listen".to_string(),
                configuration: serde_json::json!({"listen": "127.0.0.1:19721"}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(NewInput {
                id: None,
                kind: "http".to_string(),
                title: "no-listen".to_string(),
                configuration: serde_json::json!({}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(NewInput {
                id: None,
                kind: "syslog".to_string(),
                title: "other-type".to_string(),
                configuration: serde_json::json!({"listen": "127.0.0.1:19722"}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();

        controller.restore().await;

        // The restored instance owns its port; the skipped rows started
        // nothing (the other-type port stays bindable).
        assert!(tokio::net::TcpListener::bind("127.0.0.1:19721").await.is_err());
        assert!(tokio::net::TcpListener::bind("127.0.0.1:19722").await.is_ok());

        controller.stop_all().await;
        let rebind = tokio::net::TcpListener::bind("127.0.0.1:19721").await;
        assert!(rebind.is_ok());
    }

    #[tokio::test]
    async fn restore_rebinds_empty_host_listen() {
        let (controller, store) = controller();
        store
            .create(NewInput {
                id: None,
                kind: "http".to_string(),
                title: "wildcard".to_string(),
                configuration: serde_json::json!({"listen": ":19726"}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();

        controller.restore().await;

        // The persisted `:PORT` form comes back up after a restart.
        let conn = tokio::net::TcpStream::connect("127.0.0.1:19726").await;
        assert!(conn.is_ok());
        drop(conn);

        controller.stop_all().await;
        let rebind = tokio::net::TcpListener::bind("0.0.0.0:19726").await;
        assert!(rebind.is_ok());
    }

    #[tokio::test]
    async fn restore_continues_past_failing_rows() {
        let (controller, store) = controller();
        // First row cannot bind; second can.
        let blocker = tokio::net::TcpListener::bind("127.0.0.1:19723")
            .await
            .expect("bind blocker");

        store
            .create(NewInput {
                id: None,
                kind: "http".to_string(),
                title: "blocked".to_string(),
                configuration: serde_json::json!({"listen": "127.0.0.1:19723"}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(NewInput {
                id: None,
                kind: "http".to_string(),
                title: "healthy".to_string(),
                configuration: serde_json::json!({"listen": "127.0.0.1:19724"}),
                desired_state: InputState::Running,
                ..Default::default()
            })
            .await
            .unwrap();

        controller.restore().await;

        // The healthy row was restored despite the earlier failure.
        assert!(tokio::net::TcpListener::bind("127.0.0.1:19724").await.is_err());

        controller.stop_all().await;
        drop(blocker);
    }
}
