use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};

use lessonhub_core::OrderId;
use lessonhub_orders::OrderRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let key = match dto::idempotency_key(&headers) {
        Ok(k) => k,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let Json(request) = match body {
        Ok(b) => b,
        Err(rejection) => return dto::json_rejection(rejection),
    };

    match services.orders.submit(request, key).await {
        Ok(submission) if submission.replayed => (
            StatusCode::OK,
            Json(dto::OrderCreatedResponse {
                message: "Order already placed",
                inserted_id: submission.order_id,
            }),
        )
            .into_response(),
        Ok(submission) => (
            StatusCode::CREATED,
            Json(dto::OrderCreatedResponse {
                message: "Order placed successfully",
                inserted_id: submission.order_id,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.orders.get(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
