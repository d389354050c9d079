use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{auth, resource, system};
use crate::middleware::{identity_middleware, legacy_redirect_middleware};
use crate::models::{Classroom, EntityModel, School, Student, Teacher, User};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/auth/login", post(auth::login))
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .merge(collection_routes::<School>())
        .merge(collection_routes::<Classroom>())
        .merge(collection_routes::<Student>())
        .merge(collection_routes::<Teacher>())
        .merge(collection_routes::<User>())
        // Bare legacy path: redirected for SchoolAdmins, the plain classroom list otherwise
        .route("/api/classrooms/school", get(resource::list::<Classroom>))
        .route("/api/classrooms/school/:school_id", get(resource::classrooms_by_school))
        // route_layer: the last one added runs first
        .route_layer(from_fn_with_state(state.clone(), legacy_redirect_middleware))
        .route_layer(from_fn_with_state(state, identity_middleware))
}

fn collection_routes<M: EntityModel>() -> Router<AppState> {
    let collection = format!("/api/{}", M::ENTITY.collection());
    let item = format!("{}/:id", collection);

    Router::new()
        .route(&collection, get(resource::list::<M>).post(resource::create::<M>))
        .route(
            &item,
            get(resource::read::<M>)
                .put(resource::update::<M>)
                .delete(resource::delete::<M>),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
