//! Shared HTTP plumbing: response envelope, error mapping, validated JSON

pub mod validated_json;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::shared::errors::DomainError;

pub use validated_json::ValidatedJson;

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::ResourceUnavailable(_)
        | DomainError::InvalidTransition { .. }
        | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) | DomainError::ItemUnavailable(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a domain error onto the response envelope.
pub fn api_error(e: DomainError) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

pub fn unprocessable(message: impl Into<String>) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::error(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_map_to_status() {
        assert_eq!(
            status_for(&DomainError::not_found("PC", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DomainError::ResourceUnavailable(1)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::invalid_transition("Order", 1, "delivered", "cancel")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::ItemUnavailable(3)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DomainError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_envelope_omits_error_on_success() {
        let json = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 5}));

        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "data": null, "error": "nope"})
        );
    }
}
