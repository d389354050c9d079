use serde::{Deserialize, Serialize};

use super::{EntityModel, Reference, Validate, ValidationError, Validator};
use crate::types::{EntityType, Role};

pub const MIN_PASSWORD_LEN: usize = 4;

pub struct User;

impl EntityModel for User {
    const ENTITY: EntityType = EntityType::User;
    type Create = CreateUser;
    type Update = UpdateUser;
}

/// The password arrives in clear text and is hashed before storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
}

impl Validate for CreateUser {
    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .non_empty("name", &self.name)
            .email("email", &self.email)
            .min_len("password", &self.password, MIN_PASSWORD_LEN)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
}

impl Validate for UpdateUser {
    fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_lowercase();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.name.as_deref(), |v, name| {
                v.non_empty("name", name);
            })
            .optional(self.email.as_deref(), |v, email| {
                v.email("email", email);
            })
            .optional(self.password.as_deref(), |v, password| {
                v.min_len("password", password, MIN_PASSWORD_LEN);
            })
            .finish()
    }
}
