use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::access::Actor;
use crate::state::AppState;

/// Send SchoolAdmins hitting school-wide legacy routes to their own school.
/// Must run after `identity_middleware`.
pub async fn legacy_redirect_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.api.enable_legacy_redirects && request.method() == Method::GET {
        let target = request
            .extensions()
            .get::<Actor>()
            .and_then(|actor| state.redirects.advise_redirect(actor, request.uri().path()));

        if let Some(target) = target {
            tracing::debug!("Redirecting {} to {}", request.uri().path(), target.location);
            return Redirect::temporary(&target.location).into_response();
        }
    }

    next.run(request).await
}
