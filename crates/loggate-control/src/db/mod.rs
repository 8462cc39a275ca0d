//! Database layer for the control plane.

mod inputs;
mod models;
mod pool;

pub use inputs::InputsRepository;
pub use models::{InputRecord, InputState, InputUpdate, NewInput};
pub use pool::{create_pool, run_migrations};

use async_trait::async_trait;
use uuid::Uuid;

/// Durable catalog of input definitions.
///
/// Backed by Postgres in production ([`InputsRepository`]); the controller
/// only depends on this trait so it can be exercised against an in-memory
/// store in tests.
#[async_trait]
pub trait InputStore: Send + Sync {
    /// Persist a new input. Assigns an id when unset; returns the stored
    /// row with `id` and `created_at` filled from the store.
    async fn create(&self, input: NewInput) -> Result<InputRecord, sqlx::Error>;

    /// All inputs, newest first.
    async fn list(&self) -> Result<Vec<InputRecord>, sqlx::Error>;

    /// One input by id, or `None` when absent.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<InputRecord>, sqlx::Error>;

    /// Replace the mutable fields of an input. Returns the updated row, or
    /// `None` when absent. `id` and `created_at` never change.
    async fn update(&self, id: Uuid, update: InputUpdate)
        -> Result<Option<InputRecord>, sqlx::Error>;

    /// Delete an input. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}
