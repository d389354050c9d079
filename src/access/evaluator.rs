use serde_json::Value;
use thiserror::Error;

use super::actor::Actor;
use super::decision::{Decision, DenyReason, Scope, Target};
use super::ownership::{OwnershipError, OwnershipLookup, OwnershipRule};
use super::policy::RoleSet;
use crate::database::Document;
use crate::types::{EntityType, Operation, TenantId};

/// Infrastructure failure while evaluating. Never converted into an allow.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("ownership lookup failed: {0}")]
    Lookup(#[from] OwnershipError),
}

/// Evaluation states. Each transition either reaches a decision or moves to
/// the next check, in this fixed order.
#[derive(Debug)]
enum State {
    Start,
    RequireTenant,
    RequireRole(TenantId),
    CheckCreateBody(TenantId),
    CheckResource(TenantId),
    CheckUpdateBody(TenantId),
    ScopeCollection(TenantId),
    Done(Decision),
}

/// Decides whether an actor may perform an operation, and how it must be scoped
pub struct TenantAccessEvaluator<L> {
    lookup: L,
}

impl<L: OwnershipLookup> TenantAccessEvaluator<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Evaluate one request. Performs at most one ownership lookup and holds no
    /// state between calls.
    pub async fn evaluate(
        &self,
        actor: &Actor,
        entity: EntityType,
        operation: Operation,
        target: Target<'_>,
        allowed: RoleSet,
    ) -> Result<Decision, AccessError> {
        let rule = OwnershipRule::for_entity(entity);
        let mut state = State::Start;

        loop {
            state = match state {
                State::Start => {
                    if actor.is_super_admin() {
                        State::Done(Decision::Allow)
                    } else {
                        State::RequireTenant
                    }
                }

                State::RequireTenant => match actor.tenant {
                    Some(tenant) => State::RequireRole(tenant),
                    None => State::Done(Decision::Deny(DenyReason::NoTenantAssigned)),
                },

                State::RequireRole(tenant) => {
                    if allowed.contains(actor.role) {
                        State::CheckCreateBody(tenant)
                    } else {
                        State::Done(Decision::Deny(DenyReason::RoleNotPermitted))
                    }
                }

                State::CheckCreateBody(tenant) => {
                    match (operation, claimed_tenant(target.body, rule)) {
                        (Operation::Create, Some(claimed)) if claims_tenant(claimed, tenant) => {
                            State::Done(Decision::AllowScoped(Scope::new(rule.scoping_field(), tenant)))
                        }
                        (Operation::Create, Some(_)) => {
                            State::Done(Decision::Deny(DenyReason::CrossTenantWrite))
                        }
                        _ => State::CheckResource(tenant),
                    }
                }

                State::CheckResource(tenant) => match target.resource_id {
                    None => State::ScopeCollection(tenant),
                    Some(id) => match self.lookup.owner_of(entity, id).await {
                        Err(OwnershipError::NotFound) => State::Done(Decision::Deny(DenyReason::NotFound)),
                        Err(e) => return Err(e.into()),
                        Ok(owner) if owner.is_owned_by(tenant) => State::CheckUpdateBody(tenant),
                        Ok(_) => State::Done(Decision::Deny(DenyReason::CrossTenantAccess)),
                    },
                },

                // An owned resource still must not be moved to another school
                State::CheckUpdateBody(tenant) => match (operation, claimed_tenant(target.body, rule)) {
                    (Operation::Update, Some(claimed)) if !claims_tenant(claimed, tenant) => {
                        State::Done(Decision::Deny(DenyReason::CrossTenantWrite))
                    }
                    _ => State::Done(Decision::Allow),
                },

                State::ScopeCollection(tenant) => {
                    State::Done(Decision::AllowScoped(Scope::new(rule.scoping_field(), tenant)))
                }

                State::Done(decision) => return Ok(decision),
            };
        }
    }
}

/// Value of the scoping field in a body, when the body carries one
fn claimed_tenant(body: Option<&Document>, rule: OwnershipRule) -> Option<&Value> {
    body.and_then(|b| b.get(rule.scoping_field()))
}

fn claims_tenant(claimed: &Value, tenant: TenantId) -> bool {
    claimed
        .as_str()
        .and_then(|s| s.parse::<TenantId>().ok())
        .is_some_and(|claimed| claimed == tenant)
}
