use serde::{Deserialize, Serialize};

use super::{EntityModel, Validate, ValidationError, Validator};
use crate::types::EntityType;

pub struct School;

impl EntityModel for School {
    const ENTITY: EntityType = EntityType::School;
    type Create = CreateSchool;
    type Update = UpdateSchool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSchool {
    pub name: String,
    pub address: String,
    pub contact_number: String,
}

impl Validate for CreateSchool {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .non_empty("name", &self.name)
            .non_empty("address", &self.address)
            .digits("contactNumber", &self.contact_number, 10, 15)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSchool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

impl Validate for UpdateSchool {
    fn normalize(&mut self) {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.name.as_deref(), |v, name| {
                v.non_empty("name", name);
            })
            .optional(self.address.as_deref(), |v, address| {
                v.non_empty("address", address);
            })
            .optional(self.contact_number.as_deref(), |v, number| {
                v.digits("contactNumber", number, 10, 15);
            })
            .finish()
    }
}
