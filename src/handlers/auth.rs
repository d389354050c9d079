use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::identity::actor_from_user;
use crate::access::Actor;
use crate::auth::{verify_password, AuthError};
use crate::database::document_id;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::EntityType;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// POST /api/auth/login - exchange email and password for a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "admin@north.edu", "password": "..." }
/// ```
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "token": "eyJhbGciOiJIUzI1NiI...", "expiresIn": 86400 } }
/// ```
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = body.email.trim().to_lowercase();

    let users = state
        .store
        .find(EntityType::User, &Filter::new().eq("email", email.clone()))
        .await
        .map_err(AuthError::from)?;

    let Some(user) = users.into_iter().next() else {
        tracing::info!("Login rejected for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    let hash = user.get("password").and_then(Value::as_str).unwrap_or_default();
    if !verify_password(&body.password, hash) {
        tracing::info!("Login rejected for {}", email);
        return Err(AuthError::InvalidCredentials.into());
    }

    let id = document_id(&user).map_err(|e| {
        tracing::error!("User record without id: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;
    let actor = actor_from_user(id, &user)?;
    let token = state
        .jwt
        .issue(actor.id, actor.role, actor.tenant.map(|t| t.as_uuid()))?;

    tracing::info!(user = %actor.id, role = %actor.role, "Issued token");
    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: state.jwt.ttl_seconds(),
    }))
}

/// GET /api/auth/whoami - the caller as the server sees them
///
/// Role and school come from the stored user record, not the token.
pub async fn whoami(Extension(actor): Extension<Actor>) -> ApiResult<Actor> {
    Ok(ApiResponse::success(actor))
}
