//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store construction and the services built on it
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir};

use lessonhub_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Router-level settings taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub images_dir: PathBuf,
    pub request_log: bool,
}

impl From<&AppConfig> for AppOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            images_dir: config.images_dir(),
            request_log: config.request_log,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>, options: AppOptions) -> Router {
    let router = Router::new()
        .route("/", get(routes::system::index))
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .nest_service("/images", ServeDir::new(&options.images_dir))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(CorsLayer::permissive()),
        );

    if options.request_log {
        router.layer(axum::middleware::from_fn(middleware::log_requests))
    } else {
        router
    }
}
