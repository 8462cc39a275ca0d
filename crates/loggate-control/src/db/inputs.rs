//! Inputs repository for CRUD operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{InputRecord, InputUpdate, NewInput};
use super::InputStore;

/// Postgres-backed [`InputStore`].
#[derive(Clone)]
pub struct InputsRepository {
    pool: PgPool,
}

impl InputsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InputStore for InputsRepository {
    async fn create(&self, input: NewInput) -> Result<InputRecord, sqlx::Error> {
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        sqlx::query_as::<_, InputRecord>(
            r#"
            INSERT INTO inputs (id, type, title, configuration, global, node_id, creator_user_id, desired_state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.kind)
        .bind(&input.title)
        .bind(&input.configuration)
        .bind(input.global)
        .bind(&input.node_id)
        .bind(&input.creator_user_id)
        .bind(input.desired_state.as_str())
        .fetch_one(&self.pool)
        .await
    }

    async fn list(&self) -> Result<Vec<InputRecord>, sqlx::Error> {
        sqlx::query_as::<_, InputRecord>("SELECT * FROM inputs ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<InputRecord>, sqlx::Error> {
        sqlx::query_as::<_, InputRecord>("SELECT * FROM inputs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update(
        &self,
        id: Uuid,
        update: InputUpdate,
    ) -> Result<Option<InputRecord>, sqlx::Error> {
        sqlx::query_as::<_, InputRecord>(
            r#"
            UPDATE inputs
            SET type = $2, title = $3, configuration = $4, desired_state = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.kind)
        .bind(&update.title)
        .bind(&update.configuration)
        .bind(update.desired_state.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inputs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
