use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use lessonhub_core::DomainError;
use lessonhub_infra::{ServiceError, store::StoreError};

/// Map a service failure to its HTTP response. The only place where error
/// kinds become status codes.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, .. } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "field": field,
                "message": message,
            })),
        )
            .into_response(),
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientStock {
            lesson_id,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "lessonId": lesson_id,
                "requested": requested,
                "available": available,
                "message": message,
            })),
        )
            .into_response(),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store failure");
    match err {
        StoreError::Unavailable(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_unavailable",
            "the lesson store is unavailable",
        ),
        StoreError::DuplicateIdempotencyKey => json_error(
            StatusCode::CONFLICT,
            "conflict",
            "idempotency key already used",
        ),
        StoreError::Backend(_) | StoreError::Corrupt(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            "the lesson store could not complete the request",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
