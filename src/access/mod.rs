//! Tenant isolation: who the caller is, what they may touch, and how their
//! reads and writes are confined to their own school.

pub mod actor;
pub mod decision;
pub mod evaluator;
pub mod identity;
pub mod ownership;
pub mod policy;
pub mod redirect;

pub use actor::Actor;
pub use decision::{Decision, DenyReason, Scope, Target};
pub use evaluator::{AccessError, TenantAccessEvaluator};
pub use identity::{bearer_token, IdentityResolver};
pub use ownership::{Ownership, OwnershipError, OwnershipLookup, OwnershipRule, ResourceOwnership};
pub use policy::{check_role_grant, AccessPolicy, RoleSet};
pub use redirect::{RedirectAdvisor, RedirectRule, RedirectTarget};
