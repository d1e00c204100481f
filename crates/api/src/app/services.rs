//! Store construction and the services that share it.

use std::sync::Arc;

use tracing::info;

use lessonhub_catalog::{Lesson, fixtures::demo_catalog};
use lessonhub_infra::{
    AppConfig, CatalogService, OrderIntake,
    store::{CatalogStore, InMemoryStore, PostgresStore, Store, StoreResult},
};

/// Everything a request handler needs. One store client, created at startup
/// and handed to each service.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn Store>,
    pub catalog: CatalogService<dyn Store>,
    pub orders: OrderIntake<dyn Store>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderIntake::new(store.clone()),
            store,
        }
    }

    /// In-memory services holding `lessons` (dev/test).
    pub fn in_memory(lessons: impl IntoIterator<Item = Lesson>) -> Self {
        Self::new(Arc::new(InMemoryStore::with_lessons(lessons)))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Close the store client. Call once, after the server stops.
    pub async fn close(&self) {
        self.store.close().await;
        info!(backend = self.backend(), "store closed");
    }
}

/// Build services from configuration.
///
/// A configured database that cannot be reached is an error: the process
/// should not start serving requests that can only fail.
pub async fn build_services(config: &AppConfig) -> StoreResult<AppServices> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => Arc::new(InMemoryStore::new()),
    };

    if config.seed_demo_catalog {
        let added = store.seed_lessons(&demo_catalog()).await?;
        info!(added, backend = store.backend(), "demo catalog seeded");
    }

    Ok(AppServices::new(store))
}
