use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{DatabaseError, DocumentStore, MemoryStore, PgDocumentStore};
use crate::config::DatabaseConfig;

/// Builds the document store the server runs against
pub struct DatabaseManager;

impl DatabaseManager {
    /// Name of the single table holding every entity
    pub const DOCUMENTS_TABLE: &'static str = "documents";

    /// Postgres when `DATABASE_URL` is configured, otherwise an in-process store
    pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        match config.url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                let pool = Self::connect(url, config).await?;
                Self::ensure_schema(&pool).await?;
                Ok(Arc::new(PgDocumentStore::new(pool)))
            }
            _ => {
                tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Open a connection pool
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if !Self::is_postgres_url(url) {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL must be a postgres:// URL"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!("Connected to database (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Create the documents table and its indexes if they do not exist
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        let statements = [
            format!(
                r#"CREATE TABLE IF NOT EXISTS {table} (
                    entity_type TEXT NOT NULL,
                    id UUID NOT NULL,
                    body JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    PRIMARY KEY (entity_type, id)
                )"#,
                table = Self::DOCUMENTS_TABLE
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {table}_body_idx ON {table} USING GIN (body jsonb_path_ops)",
                table = Self::DOCUMENTS_TABLE
            ),
        ];

        for statement in statements {
            sqlx::query(&statement).execute(pool).await?;
        }

        info!("Database schema ready");
        Ok(())
    }

    fn is_postgres_url(url: &str) -> bool {
        url.starts_with("postgres://") || url.starts_with("postgresql://")
    }
}
