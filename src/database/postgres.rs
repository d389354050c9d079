use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{normalize_references, DatabaseError, Document, DocumentStore};
use crate::filter::Filter;
use crate::types::EntityType;

/// Postgres-backed store. Every entity lives in one JSONB table partitioned by
/// `entity_type`; equality filters become a JSONB containment test.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_by_id(&self, entity: EntityType, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let row: Option<Json<Document>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE entity_type = $1 AND id = $2",
        )
        .bind(entity.collection())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn find(&self, entity: EntityType, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let rows: Vec<Json<Document>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE entity_type = $1 AND body @> $2 ORDER BY created_at, id",
        )
        .bind(entity.collection())
        .bind(Json(filter.to_json()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn insert(&self, entity: EntityType, mut doc: Document) -> Result<Document, DatabaseError> {
        normalize_references(&mut doc)?;

        let id = match doc.get("id").and_then(Value::as_str) {
            Some(existing) => Uuid::parse_str(existing).map_err(|_| DatabaseError::MissingId)?,
            None => Uuid::new_v4(),
        };
        let now = Value::String(Utc::now().to_rfc3339());
        doc.insert("id".to_string(), Value::String(id.to_string()));
        doc.insert("createdAt".to_string(), now.clone());
        doc.insert("updatedAt".to_string(), now);

        let Json(saved): Json<Document> = sqlx::query_scalar(
            "INSERT INTO documents (entity_type, id, body) VALUES ($1, $2, $3) RETURNING body",
        )
        .bind(entity.collection())
        .bind(id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Inserted {} {}", entity.label(), id);
        Ok(saved)
    }

    async fn update(
        &self,
        entity: EntityType,
        id: Uuid,
        mut changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        normalize_references(&mut changes)?;
        changes.remove("id");
        changes.remove("createdAt");
        changes.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));

        let row: Option<Json<Document>> = sqlx::query_scalar(
            r#"UPDATE documents
               SET body = body || $3, updated_at = now()
               WHERE entity_type = $1 AND id = $2
               RETURNING body"#,
        )
        .bind(entity.collection())
        .bind(id)
        .bind(Json(&changes))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn delete(&self, entity: EntityType, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM documents WHERE entity_type = $1 AND id = $2")
            .bind(entity.collection())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
