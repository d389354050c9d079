//! Request payloads for each entity collection

pub mod classroom;
pub mod school;
pub mod student;
pub mod teacher;
pub mod user;
pub mod validation;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::database::Document;
use crate::types::EntityType;

pub use classroom::Classroom;
pub use school::School;
pub use student::Student;
pub use teacher::Teacher;
pub use user::User;
pub use validation::{Validate, ValidationError, Validator};

/// Binds a collection to its create and update payloads
pub trait EntityModel: Send + Sync + 'static {
    const ENTITY: EntityType;
    type Create: DeserializeOwned + Serialize + Validate + Send;
    type Update: DeserializeOwned + Serialize + Validate + Send;
}

/// Reference to another entity. Accepts a bare id or a populated object
/// (`{"id": ...}` / `{"_id": ...}`) and always serializes as the bare id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference(pub Uuid);

impl Reference {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Missing-field errors surface from here, so they keep the field name
        let value = Value::deserialize(deserializer)?;
        let id = match &value {
            Value::String(id) => Some(id.as_str()),
            Value::Object(map) => map.get("id").or_else(|| map.get("_id")).and_then(Value::as_str),
            _ => None,
        };
        id.and_then(|id| Uuid::parse_str(id).ok())
            .map(Reference)
            .ok_or_else(|| serde::de::Error::custom("expected an id or an object with an id"))
    }
}

/// Decode and validate a JSON body into a typed payload
pub fn parse_payload<T>(body: Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let mut payload: T = serde_json::from_value(body)
        .map_err(|e| ValidationError::new(format!("Invalid request body: {}", e)))?;
    payload.normalize();
    payload.validate()?;
    Ok(payload)
}

/// Flatten a payload into the document shape the store and evaluator work with
pub fn into_document<T: Serialize>(payload: &T) -> Result<Document, ValidationError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::new("Request body must be a JSON object")),
        Err(e) => Err(ValidationError::new(format!("Invalid request body: {}", e))),
    }
}
