use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lessonhub_catalog::Spaces;
use lessonhub_core::{DomainError, DomainResult, OrderId};
use lessonhub_orders::IdempotencyKey;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Body of `PUT /lessons/:id`, checked by hand so that a non-numeric
/// `spaces` is reported as a validation error on that field.
pub fn parse_set_spaces(body: &Value) -> DomainResult<Spaces> {
    match body.get("spaces") {
        None | Some(Value::Null) => Err(DomainError::validation("spaces", "is required")),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Spaces::from_i64("spaces", v),
            None if n.is_u64() => Err(DomainError::validation("spaces", "spaces is too large")),
            None => Err(DomainError::validation("spaces", "must be an integer")),
        },
        Some(_) => Err(DomainError::validation("spaces", "must be a number")),
    }
}

/// Optional `Idempotency-Key` request header.
pub fn idempotency_key(headers: &HeaderMap) -> DomainResult<Option<IdempotencyKey>> {
    match headers.get(IdempotencyKey::FIELD) {
        None => Ok(None),
        Some(raw) => {
            let raw = raw.to_str().map_err(|_| {
                DomainError::validation(IdempotencyKey::FIELD, "must contain printable ASCII only")
            })?;
            IdempotencyKey::parse(raw).map(Some)
        }
    }
}

/// Turn a body extraction failure into the API's error shape.
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub message: &'static str,
    pub inserted_id: OrderId,
}
