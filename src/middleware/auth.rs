use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller from the Authorization header and attach the resulting
/// `Actor` to the request. Runs before any role or tenant logic.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedCredential))
        .transpose()?;

    let actor = state.identity.resolve(header).await?;
    tracing::debug!(actor = %actor.id, role = %actor.role, "Resolved caller");

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
