use serde::Serialize;
use uuid::Uuid;

use crate::types::{Role, TenantId};

/// The authenticated caller, rebuilt from the user record on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(rename = "school")]
    pub tenant: Option<TenantId>,
}

impl Actor {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role, tenant: Option<TenantId>) -> Self {
        Self {
            id,
            email: email.into(),
            role,
            tenant,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}
