use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::Document;
use crate::filter::Filter;
use crate::types::TenantId;

/// Outcome of one access evaluation. Never cached beyond the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed unchanged
    Allow,
    /// Proceed, with the scope applied to the outgoing filter or body
    AllowScoped(Scope),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Decision::AllowScoped(scope) => Some(scope),
            _ => None,
        }
    }
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DenyReason {
    #[error("actor has no school assigned")]
    NoTenantAssigned,

    #[error("role is not permitted for this operation")]
    RoleNotPermitted,

    #[error("body targets another school")]
    CrossTenantWrite,

    #[error("resource belongs to another school")]
    CrossTenantAccess,

    #[error("resource not found")]
    NotFound,
}

impl DenyReason {
    pub fn status_code(&self) -> u16 {
        match self {
            DenyReason::NotFound => 404,
            _ => 403,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NoTenantAssigned => "NO_TENANT_ASSIGNED",
            DenyReason::RoleNotPermitted => "ROLE_NOT_PERMITTED",
            DenyReason::CrossTenantWrite => "CROSS_TENANT_WRITE",
            DenyReason::CrossTenantAccess => "CROSS_TENANT_ACCESS",
            DenyReason::NotFound => "NOT_FOUND",
        }
    }
}

/// Tenant restriction produced by an `AllowScoped` decision.
///
/// The evaluator never touches the request; callers apply the scope to
/// whatever they are about to send to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    field: &'static str,
    tenant: TenantId,
}

impl Scope {
    pub fn new(field: &'static str, tenant: TenantId) -> Self {
        Self { field, tenant }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    fn value(&self) -> Value {
        Value::String(self.tenant.to_string())
    }

    /// Force the scoping clause, replacing any caller value for that field
    pub fn apply_to_filter(&self, filter: &mut Filter) {
        filter.set(self.field, self.value());
    }

    /// Force the scoping field on a body about to be written
    pub fn apply_to_body(&self, body: &mut Document) {
        body.insert(self.field.to_string(), self.value());
    }
}

/// What the request addresses: a body for writes, an id for single resources
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    pub body: Option<&'a Document>,
    pub resource_id: Option<Uuid>,
}

impl<'a> Target<'a> {
    pub fn collection() -> Self {
        Self::default()
    }

    pub fn body(body: &'a Document) -> Self {
        Self {
            body: Some(body),
            resource_id: None,
        }
    }

    pub fn resource(id: Uuid) -> Self {
        Self {
            body: None,
            resource_id: Some(id),
        }
    }

    pub fn with_body(mut self, body: &'a Document) -> Self {
        self.body = Some(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_overrides_conflicting_filter_value() {
        let tenant = TenantId::new(Uuid::new_v4());
        let scope = Scope::new("school", tenant);

        let mut filter = Filter::new().eq("school", "elsewhere").eq("name", "7B");
        scope.apply_to_filter(&mut filter);

        assert_eq!(filter.get("school"), Some(&json!(tenant.to_string())));
        assert_eq!(filter.get("name"), Some(&json!("7B")));
    }

    #[test]
    fn scope_sets_body_field() {
        let tenant = TenantId::new(Uuid::new_v4());
        let mut body = Document::new();
        Scope::new("school", tenant).apply_to_body(&mut body);
        assert_eq!(body["school"], json!(tenant.to_string()));
    }

    #[test]
    fn deny_reasons_map_to_statuses() {
        assert_eq!(DenyReason::NoTenantAssigned.status_code(), 403);
        assert_eq!(DenyReason::RoleNotPermitted.status_code(), 403);
        assert_eq!(DenyReason::CrossTenantWrite.status_code(), 403);
        assert_eq!(DenyReason::CrossTenantAccess.status_code(), 403);
        assert_eq!(DenyReason::NotFound.status_code(), 404);
    }
}
