use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{document_id, normalize_references, DatabaseError, Document, DocumentStore};
use crate::filter::Filter;
use crate::types::EntityType;

/// In-process store used when no database is configured, and by tests.
/// Documents are kept in insertion order per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<EntityType, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(&self, entity: EntityType, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&entity).and_then(|docs| {
            docs.iter()
                .find(|doc| document_id(doc).ok() == Some(id))
                .cloned()
        }))
    }

    async fn find(&self, entity: EntityType, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&entity)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
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

        let mut collections = self.collections.write().await;
        let docs = collections.entry(entity).or_default();
        if docs.iter().any(|d| document_id(d).ok() == Some(id)) {
            return Err(DatabaseError::QueryError(format!("duplicate id {} in {}", id, entity.collection())));
        }
        docs.push(doc.clone());
        Ok(doc)
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

        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&entity)
            .and_then(|docs| docs.iter_mut().find(|d| document_id(d).ok() == Some(id)))
        else {
            return Ok(None);
        };

        for (key, value) in changes {
            doc.insert(key, value);
        }
        doc.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, entity: EntityType, id: Uuid) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&entity) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| document_id(d).ok() != Some(id));
        Ok(docs.len() != before)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
