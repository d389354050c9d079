use serde_json::Value;
use std::sync::Arc;

use super::actor::Actor;
use crate::auth::{AuthError, CredentialVerifier};
use crate::database::{Document, DocumentStore};
use crate::types::{EntityType, Role, TenantId};

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}

/// Turns a credential into an [`Actor`].
///
/// The token only proves who the caller is. Role and school come from the
/// stored user record, so a demoted or moved user loses access on the next
/// request instead of when the token expires.
pub struct IdentityResolver<V> {
    verifier: V,
    store: Arc<dyn DocumentStore>,
}

impl<V: CredentialVerifier> IdentityResolver<V> {
    pub fn new(verifier: V, store: Arc<dyn DocumentStore>) -> Self {
        Self { verifier, store }
    }

    pub async fn resolve(&self, authorization: Option<&str>) -> Result<Actor, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = self.verifier.verify(token)?;

        let user = self
            .store
            .find_by_id(EntityType::User, claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        actor_from_user(claims.sub, &user)
    }
}

/// Build the actor from a stored user record
pub fn actor_from_user(id: uuid::Uuid, user: &Document) -> Result<Actor, AuthError> {
    let role: Role = user
        .get("role")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::InvalidUserRecord("missing role".to_string()))?
        .parse()
        .map_err(AuthError::InvalidUserRecord)?;

    let tenant = match user.get("school") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            s.parse::<TenantId>()
                .map_err(|_| AuthError::InvalidUserRecord(format!("school '{}' is not a bare id", s)))?,
        ),
        Some(other) => {
            return Err(AuthError::InvalidUserRecord(format!(
                "school must be a bare id, got {}",
                other
            )))
        }
    };

    let email = user.get("email").and_then(Value::as_str).unwrap_or_default();

    Ok(Actor::new(id, email, role, tenant))
}
