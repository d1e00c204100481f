use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use lessonhub_catalog::SearchTerm;
use lessonhub_core::{DomainError, LessonId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_lessons))
        .route("/:id", get(get_lesson).put(set_spaces))
}

pub async fn list_lessons(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_all().await {
        Ok(lessons) => (StatusCode::OK, Json(lessons)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_lessons(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let Some(term) = query.q else {
        return errors::domain_error_to_response(DomainError::validation(
            SearchTerm::FIELD,
            "query parameter is required",
        ));
    };

    match services.catalog.search(&term).await {
        Ok(lessons) => (StatusCode::OK, Json(lessons)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_lesson(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LessonId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.get(id).await {
        Ok(lesson) => (StatusCode::OK, Json(lesson)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_spaces(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> axum::response::Response {
    let id: LessonId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return dto::json_rejection(rejection),
    };

    let spaces = match dto::parse_set_spaces(&body) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.set_spaces(id, spaces).await {
        Ok(()) => (
            StatusCode::OK,
            Json(dto::MessageResponse::new(format!(
                "Lesson {id} updated: {spaces} spaces remaining"
            ))),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
