pub mod manager;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::Filter;
use crate::types::EntityType;

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// A stored entity: a JSON object carrying at least an `id` string
pub type Document = Map<String, Value>;

/// Fields that hold references to other entities
pub const REFERENCE_FIELDS: &[&str] = &["school", "classroom", "teacher", "user", "createdBy"];

/// Errors from the document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid reference in field '{field}': {reason}")]
    InvalidReference { field: String, reason: String },

    #[error("Document has no valid id")]
    MissingId,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Persistence boundary for all entities.
///
/// Implementations must store references (`school`, `classroom`, ...) as bare id
/// strings; [`normalize_references`] enforces that on every write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_by_id(&self, entity: EntityType, id: Uuid) -> Result<Option<Document>, DatabaseError>;

    async fn find(&self, entity: EntityType, filter: &Filter) -> Result<Vec<Document>, DatabaseError>;

    /// Insert a new document. Assigns `id`, `createdAt` and `updatedAt`.
    async fn insert(&self, entity: EntityType, doc: Document) -> Result<Document, DatabaseError>;

    /// Merge `changes` into an existing document. `None` when the id is unknown.
    async fn update(
        &self,
        entity: EntityType,
        id: Uuid,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError>;

    /// `false` when the id is unknown
    async fn delete(&self, entity: EntityType, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Reduce every reference field to a bare id string.
///
/// A populated reference object (`{"id": "..."}` or `{"_id": "..."}`) is collapsed
/// to its id; anything else that is not a UUID string is rejected.
pub fn normalize_references(doc: &mut Document) -> Result<(), DatabaseError> {
    for field in REFERENCE_FIELDS {
        let Some(value) = doc.get_mut(*field) else {
            continue;
        };

        let id = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("_id"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| DatabaseError::InvalidReference {
                    field: field.to_string(),
                    reason: "reference object has no id".to_string(),
                })?,
            other => {
                return Err(DatabaseError::InvalidReference {
                    field: field.to_string(),
                    reason: format!("expected an id string, got {}", other),
                })
            }
        };

        let parsed = Uuid::parse_str(&id).map_err(|_| DatabaseError::InvalidReference {
            field: field.to_string(),
            reason: format!("'{}' is not a valid id", id),
        })?;
        *value = Value::String(parsed.to_string());
    }
    Ok(())
}

/// Read the `id` of a stored document
pub fn document_id(doc: &Document) -> Result<Uuid, DatabaseError> {
    doc.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(DatabaseError::MissingId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn populated_references_collapse_to_ids() {
        let school = Uuid::new_v4();
        let mut doc = json!({"name": "7B", "school": {"id": school.to_string(), "name": "North"}})
            .as_object()
            .cloned()
            .unwrap();

        normalize_references(&mut doc).unwrap();
        assert_eq!(doc["school"], json!(school.to_string()));
        assert_eq!(doc["name"], json!("7B"));
    }

    #[test]
    fn mongo_style_ids_are_accepted() {
        let school = Uuid::new_v4();
        let mut doc = json!({"school": {"_id": school.to_string()}}).as_object().cloned().unwrap();
        normalize_references(&mut doc).unwrap();
        assert_eq!(doc["school"], json!(school.to_string()));
    }

    #[test]
    fn malformed_references_are_rejected() {
        let mut doc = json!({"school": 42}).as_object().cloned().unwrap();
        assert!(matches!(
            normalize_references(&mut doc),
            Err(DatabaseError::InvalidReference { .. })
        ));

        let mut doc = json!({"classroom": "not-an-id"}).as_object().cloned().unwrap();
        assert!(normalize_references(&mut doc).is_err());

        let mut doc = json!({"school": {"name": "North"}}).as_object().cloned().unwrap();
        assert!(normalize_references(&mut doc).is_err());
    }

    #[test]
    fn null_references_are_left_alone() {
        let mut doc = json!({"teacher": null}).as_object().cloned().unwrap();
        normalize_references(&mut doc).unwrap();
        assert_eq!(doc["teacher"], Value::Null);
    }
}
