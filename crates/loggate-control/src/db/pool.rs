//! Database pool creation and schema bootstrap.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// The single table the gateway owns.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inputs (
    id              UUID PRIMARY KEY,
    type            TEXT NOT NULL,
    title           TEXT NOT NULL,
    configuration   JSONB NOT NULL DEFAULT '{}'::jsonb,
    global          BOOLEAN NOT NULL DEFAULT FALSE,
    node_id         TEXT NOT NULL DEFAULT '',
    creator_user_id TEXT NOT NULL DEFAULT '',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    desired_state   TEXT NOT NULL DEFAULT 'RUNNING'
);
CREATE INDEX IF NOT EXISTS inputs_type_idx ON inputs (type);
CREATE INDEX IF NOT EXISTS inputs_node_id_idx ON inputs (node_id);
"#;

/// Connect a pool against the configured database.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// Bring the schema up to date. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
