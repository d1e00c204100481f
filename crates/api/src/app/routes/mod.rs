use axum::{Router, routing::get};

pub mod lessons;
pub mod orders;
pub mod system;

/// Router for the storefront resources.
pub fn router() -> Router {
    Router::new()
        .route("/search", get(lessons::search_lessons))
        .nest("/lessons", lessons::router())
        .nest("/orders", orders::router())
}
