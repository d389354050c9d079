use serde::{Deserialize, Serialize};

use super::{EntityModel, Reference, Validate, ValidationError, Validator};
use crate::types::EntityType;

pub struct Classroom;

impl EntityModel for Classroom {
    const ENTITY: EntityType = EntityType::Classroom;
    type Create = CreateClassroom;
    type Update = UpdateClassroom;
}

/// `school` may be omitted by school-scoped callers; it is filled in from
/// their own school before the record is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateClassroom {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for CreateClassroom {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.non_empty("name", &self.name);
        if self.capacity == Some(0) {
            v.add("capacity", "must be at least 1");
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateClassroom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for UpdateClassroom {
    fn normalize(&mut self) {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.optional(self.name.as_deref(), |v, name| {
            v.non_empty("name", name);
        });
        if self.capacity == Some(0) {
            v.add("capacity", "must be at least 1");
        }
        v.finish()
    }
}
