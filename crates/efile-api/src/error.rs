//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps registry errors to HTTP status codes and JSON error bodies with a
//! machine-readable code and a message. Store failures are logged and
//! answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use efile_registry::{RegistryError, StoreError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_TRANSITION").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Stage precondition unmet (409).
    #[error("{message}")]
    InvalidTransition {
        message: String,
        details: serde_json::Value,
    },

    /// Lost optimistic race (409). Safe to retry with fresh state.
    #[error("{message}")]
    ConcurrentModification {
        message: String,
        details: serde_json::Value,
    },

    /// Uniqueness conflict (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// No case number could be issued (503). Safe to retry.
    #[error("{0}")]
    AllocationFailed(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::ConcurrentModification { .. } => {
                (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION")
            }
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::AllocationFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, "ALLOCATION_FAILED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match self {
            Self::InvalidTransition { details, .. }
            | Self::ConcurrentModification { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<efile_core::ValidationError> for AppError {
    fn from(err: efile_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidInput(msg) => Self::Validation(msg),
            RegistryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RegistryError::InvalidTransition { case_id, from, to } => Self::InvalidTransition {
                message: err.to_string(),
                details: serde_json::json!({
                    "case_id": case_id,
                    "current_stage": from,
                    "attempted_stage": to,
                }),
            },
            RegistryError::ConcurrentModification {
                case_id,
                expected,
                actual,
            } => Self::ConcurrentModification {
                message: err.to_string(),
                details: serde_json::json!({
                    "case_id": case_id,
                    "expected_version": expected,
                    "actual_version": actual,
                }),
            },
            RegistryError::AllocationFailed { year, .. } => {
                tracing::error!(year = year.value(), error = %err, "case number allocation failed");
                Self::AllocationFailed(format!("could not allocate a case number for {year}"))
            }
            RegistryError::Store(StoreError::Conflict(msg)) => Self::Conflict(msg),
            RegistryError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efile_core::{CaseId, FilingYear};
    use efile_registry::CaseStage;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes_by_variant() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::AllocationFailed("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "ALLOCATION_FAILED",
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn invalid_transition_maps_to_409_with_stages() {
        let err = AppError::from(RegistryError::InvalidTransition {
            case_id: CaseId::new(),
            from: CaseStage::Filed,
            to: CaseStage::Adjudicated,
        });
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "INVALID_TRANSITION");
        let details = body.error.details.unwrap();
        assert_eq!(details["current_stage"], "FILED");
        assert_eq!(details["attempted_stage"], "ADJUDICATED");
    }

    #[tokio::test]
    async fn concurrent_modification_maps_to_409_with_versions() {
        let err = AppError::from(RegistryError::ConcurrentModification {
            case_id: CaseId::new(),
            expected: 2,
            actual: 3,
        });
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "CONCURRENT_MODIFICATION");
        assert_eq!(body.error.details.unwrap()["actual_version"], 3);
    }

    #[tokio::test]
    async fn invalid_input_maps_to_422() {
        let (status, body) =
            response_parts(RegistryError::InvalidInput("title must not be empty".into()).into())
                .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error.message.contains("title"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn allocation_failure_maps_to_503() {
        let err = RegistryError::AllocationFailed {
            year: FilingYear::new(2024).unwrap(),
            reason: "connection reset".into(),
        };
        let (status, body) = response_parts(err.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error.code, "ALLOCATION_FAILED");
        assert!(!body.error.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn store_failure_hides_details() {
        let err = RegistryError::Store(StoreError::Unavailable("pg at 10.0.0.4 refused".into()));
        let (status, body) = response_parts(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn store_conflict_maps_to_409() {
        let err = RegistryError::Store(StoreError::Conflict("case_type named \"Civil\"".into()));
        let (status, body) = response_parts(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "CONFLICT");
    }

    #[test]
    fn error_body_omits_empty_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
