use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// `{"success": true, "data": ...}` body returned by every handler that succeeds
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { data, status: StatusCode::OK }
    }

    pub fn created(data: T) -> Self {
        Self { data, status: StatusCode::CREATED }
    }

    fn envelope(&self) -> Result<Value, ApiError> {
        let data = serde_json::to_value(&self.data).map_err(|e| {
            tracing::error!("Failed to serialize response data: {}", e);
            ApiError::internal_server_error("Failed to serialize response data")
        })?;
        Ok(json!({ "success": true, "data": data }))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self.envelope() {
            Ok(body) => (self.status, Json(body)).into_response(),
            // Same error body as any other failure
            Err(err) => err.into_response(),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn wraps_data_in_success_envelope() {
        let created = ApiResponse::created(json!({"id": "abc"}));
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.envelope().unwrap(), json!({"success": true, "data": {"id": "abc"}}));
        assert_eq!(ApiResponse::success(Vec::<u8>::new()).status, StatusCode::OK);
    }

    #[test]
    fn unserializable_data_is_an_internal_error() {
        // JSON object keys must be strings
        let data: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let err = ApiResponse::success(data).envelope().unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
