use axum::http::StatusCode;

pub async fn index() -> &'static str {
    "Lesson storefront API is running"
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
