use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{DatabaseError, Document, DocumentStore};
use crate::types::{EntityType, TenantId};

/// How the owning tenant of an entity type is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipRule {
    /// The tenant entity owns itself
    SelfOwned,
    /// The owner is named by a reference field on the record
    Field(&'static str),
}

impl OwnershipRule {
    pub fn for_entity(entity: EntityType) -> Self {
        match entity {
            EntityType::School => OwnershipRule::SelfOwned,
            EntityType::Classroom
            | EntityType::Student
            | EntityType::Teacher
            | EntityType::User => OwnershipRule::Field("school"),
        }
    }

    /// Field compared against the actor's tenant in filters and bodies
    pub fn scoping_field(&self) -> &'static str {
        match *self {
            OwnershipRule::SelfOwned => "id",
            OwnershipRule::Field(field) => field,
        }
    }

    /// Owner of an already-fetched record
    pub fn owner(&self, doc: &Document) -> Result<Ownership, OwnershipError> {
        let field = self.scoping_field();
        match doc.get(field) {
            None | Some(Value::Null) => Ok(Ownership::Unowned),
            Some(Value::String(id)) => id
                .parse::<TenantId>()
                .map(Ownership::Owned)
                .map_err(|_| OwnershipError::MalformedReference { field, value: id.clone() }),
            Some(other) => Err(OwnershipError::MalformedReference {
                field,
                value: other.to_string(),
            }),
        }
    }
}

/// Owning tenant of an existing resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned(TenantId),
    /// No school on the record, e.g. a SuperAdmin user
    Unowned,
}

impl Ownership {
    pub fn is_owned_by(&self, tenant: TenantId) -> bool {
        matches!(self, Ownership::Owned(owner) if *owner == tenant)
    }
}

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("resource not found")]
    NotFound,

    #[error("field '{field}' holds '{value}', expected a bare school id")]
    MalformedReference { field: &'static str, value: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Resolves who owns a resource
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    async fn owner_of(&self, entity: EntityType, id: Uuid) -> Result<Ownership, OwnershipError>;
}

/// Ownership lookup backed by the document store
#[derive(Clone)]
pub struct ResourceOwnership {
    store: Arc<dyn DocumentStore>,
}

impl ResourceOwnership {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OwnershipLookup for ResourceOwnership {
    async fn owner_of(&self, entity: EntityType, id: Uuid) -> Result<Ownership, OwnershipError> {
        let doc = self
            .store
            .find_by_id(entity, id)
            .await?
            .ok_or(OwnershipError::NotFound)?;

        OwnershipRule::for_entity(entity).owner(&doc)
    }
}
