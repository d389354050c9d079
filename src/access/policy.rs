use serde_json::Value;
use std::collections::HashMap;

use super::actor::Actor;
use super::decision::DenyReason;
use crate::database::Document;
use crate::types::{EntityType, Operation, Role};

/// Set of roles allowed to perform one operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet {
    bits: u8,
}

impl RoleSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().fold(Self::empty(), |set, role| set.with(*role))
    }

    pub fn all() -> Self {
        Self::of(&Role::ALL)
    }

    pub fn with(self, role: Role) -> Self {
        Self {
            bits: self.bits | Self::bit(role),
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.bits & Self::bit(role) != 0
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    fn bit(role: Role) -> u8 {
        match role {
            Role::SuperAdmin => 1,
            Role::SchoolAdmin => 1 << 1,
            Role::Teacher => 1 << 2,
            Role::Student => 1 << 3,
        }
    }
}

/// Allowed roles per (entity, operation), wired at route registration and
/// handed to the evaluator on each call. Unlisted pairs allow nobody but
/// SuperAdmin, which the evaluator lets through before consulting the policy.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: HashMap<(EntityType, Operation), RoleSet>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, entity: EntityType, operations: &[Operation], roles: &[Role]) -> Self {
        for op in operations {
            self.rules.insert((entity, *op), RoleSet::of(roles));
        }
        self
    }

    pub fn allowed(&self, entity: EntityType, operation: Operation) -> RoleSet {
        self.rules.get(&(entity, operation)).copied().unwrap_or_default()
    }

    /// The school-management defaults
    pub fn school_defaults() -> Self {
        use EntityType::*;
        use Operation::*;

        let admins: &[Role] = &[Role::SuperAdmin, Role::SchoolAdmin];
        let staff: &[Role] = &[Role::SuperAdmin, Role::SchoolAdmin, Role::Teacher];
        let everyone: &[Role] = &Role::ALL;

        Self::new()
            .allow(School, &[Create, Delete], &[Role::SuperAdmin])
            .allow(School, &[List, Read], everyone)
            .allow(School, &[Update], admins)
            .allow(Classroom, &[Create, Update, Delete], admins)
            .allow(Classroom, &[Read], staff)
            .allow(Classroom, &[List], everyone)
            .allow(Student, &[Create, Update, Delete], admins)
            .allow(Student, &[List, Read], staff)
            .allow(Teacher, &Operation::ALL, admins)
            .allow(User, &Operation::ALL, admins)
    }
}

/// Only a SuperAdmin may create a SuperAdmin or promote someone to one
pub fn check_role_grant(actor: &Actor, entity: EntityType, body: Option<&Document>) -> Option<DenyReason> {
    if actor.is_super_admin() || entity != EntityType::User {
        return None;
    }
    let grants_super_admin = body
        .and_then(|b| b.get("role"))
        .and_then(Value::as_str)
        .is_some_and(|role| role == Role::SuperAdmin.as_str());

    grants_super_admin.then_some(DenyReason::RoleNotPermitted)
}
