//! Generic collection handlers. Every request goes through the same steps:
//! parse and validate the body, evaluate access with the route's role set,
//! apply the resulting scope, then hand over to the record service.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::access::{check_role_grant, Actor, Decision, Scope, Target};
use crate::database::Document;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{into_document, parse_payload, EntityModel};
use crate::state::AppState;
use crate::types::{EntityType, Operation};

/// GET /api/{collection}?field=value - equality-filtered list
pub async fn list<M: EntityModel>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Document>> {
    let mut filter = Filter::new();
    for (field, value) in params {
        filter.set(field, value);
    }
    list_filtered(&state, &actor, M::ENTITY, filter).await
}

/// GET /api/classrooms/school/:school_id - classrooms of one school.
/// A school-scoped caller always gets their own school's classrooms.
pub async fn classrooms_by_school(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(school_id): Path<String>,
) -> ApiResult<Vec<Document>> {
    let school_id = parse_id(&school_id)?;
    let filter = Filter::new().eq("school", school_id.to_string());
    list_filtered(&state, &actor, EntityType::Classroom, filter).await
}

async fn list_filtered(
    state: &AppState,
    actor: &Actor,
    entity: EntityType,
    mut filter: Filter,
) -> ApiResult<Vec<Document>> {
    if let Some(scope) = authorize(state, actor, entity, Operation::List, Target::collection()).await? {
        scope.apply_to_filter(&mut filter);
    }

    let docs = state.records.list(entity, &filter).await?;
    Ok(ApiResponse::success(docs))
}

/// POST /api/{collection}
pub async fn create<M: EntityModel>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    let payload: M::Create = parse_payload(body)?;
    let mut doc = into_document(&payload)?;

    let scope = authorize(&state, &actor, M::ENTITY, Operation::Create, Target::body(&doc)).await?;
    deny_role_grant(&state, &actor, M::ENTITY, Operation::Create, &doc)?;
    if let Some(scope) = scope {
        scope.apply_to_body(&mut doc);
    }

    let saved = state.records.create(M::ENTITY, doc, actor.id).await?;
    Ok(ApiResponse::created(saved))
}

/// GET /api/{collection}/:id
pub async fn read<M: EntityModel>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let id = parse_id(&id)?;
    authorize(&state, &actor, M::ENTITY, Operation::Read, Target::resource(id)).await?;

    state
        .records
        .get(M::ENTITY, id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| not_found(M::ENTITY))
}

/// PUT /api/{collection}/:id - partial update
pub async fn update<M: EntityModel>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Document> {
    let id = parse_id(&id)?;
    let payload: M::Update = parse_payload(body)?;
    let doc = into_document(&payload)?;

    let target = Target::resource(id).with_body(&doc);
    authorize(&state, &actor, M::ENTITY, Operation::Update, target).await?;
    deny_role_grant(&state, &actor, M::ENTITY, Operation::Update, &doc)?;

    state
        .records
        .update(M::ENTITY, id, doc)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| not_found(M::ENTITY))
}

/// DELETE /api/{collection}/:id
pub async fn delete<M: EntityModel>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    authorize(&state, &actor, M::ENTITY, Operation::Delete, Target::resource(id)).await?;

    if !state.records.delete(M::ENTITY, id).await? {
        return Err(not_found(M::ENTITY));
    }
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// Run the evaluator with this route's role set and turn its decision into
/// either a scope to apply or an error response.
async fn authorize(
    state: &AppState,
    actor: &Actor,
    entity: EntityType,
    operation: Operation,
    target: Target<'_>,
) -> Result<Option<Scope>, ApiError> {
    let allowed = state.policy.allowed(entity, operation);
    let decision = state
        .evaluator
        .evaluate(actor, entity, operation, target, allowed)
        .await?;

    match decision {
        Decision::Allow => {
            tracing::debug!(actor = %actor.id, %entity, %operation, "Access allowed");
            Ok(None)
        }
        Decision::AllowScoped(scope) => {
            tracing::debug!(actor = %actor.id, %entity, %operation, school = %scope.tenant(), "Access allowed with scope");
            Ok(Some(scope))
        }
        Decision::Deny(reason) => {
            tracing::warn!(
                actor = %actor.id,
                role = %actor.role,
                %entity,
                %operation,
                resource = ?target.resource_id,
                reason = reason.code(),
                "Access denied"
            );
            Err(ApiError::from_denial(reason, state.config.security.conceal_cross_tenant))
        }
    }
}

fn deny_role_grant(
    state: &AppState,
    actor: &Actor,
    entity: EntityType,
    operation: Operation,
    body: &Document,
) -> Result<(), ApiError> {
    match check_role_grant(actor, entity, Some(body)) {
        Some(reason) => {
            tracing::warn!(actor = %actor.id, %entity, %operation, reason = reason.code(), "SuperAdmin grant refused");
            Err(ApiError::from_denial(reason, state.config.security.conceal_cross_tenant))
        }
        None => Ok(()),
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", raw)))
}

fn not_found(entity: EntityType) -> ApiError {
    ApiError::not_found(format!("{} not found", entity))
}
