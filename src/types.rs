/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roles a user can hold. SuperAdmin is the only role without a home school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::SchoolAdmin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::SchoolAdmin => "SchoolAdmin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }

    /// Whether users holding this role must belong to a school
    pub fn requires_tenant(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Entity collections exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    School,
    Classroom,
    Student,
    Teacher,
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::School,
        EntityType::Classroom,
        EntityType::Student,
        EntityType::Teacher,
        EntityType::User,
    ];

    /// Collection name, used in URLs and as the storage partition key
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::School => "schools",
            EntityType::Classroom => "classrooms",
            EntityType::Student => "students",
            EntityType::Teacher => "teachers",
            EntityType::User => "users",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityType::School => "School",
            EntityType::Classroom => "Classroom",
            EntityType::Student => "Student",
            EntityType::Teacher => "Teacher",
            EntityType::User => "User",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        EntityType::ALL.into_iter().find(|e| e.collection() == name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operations the access layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    List,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::List,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    /// Read, update and delete address a single resource by id
    pub fn is_id_addressed(&self) -> bool {
        matches!(self, Operation::Read | Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Identifier of a tenant, which is always the id of a School record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TenantId)
    }
}
