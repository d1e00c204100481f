//! Document store abstractions for lessons and orders.
//!
//! Every operation that mutates `spaces` is a single store-level atomic step;
//! callers never read a count and write it back.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use lessonhub_catalog::{Lesson, SearchTerm, Spaces};
use lessonhub_core::{LessonId, OrderId};
use lessonhub_orders::{IdempotencyKey, NewOrder, Order, Quantity};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failure reported by a store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connect/pool/IO failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed an operation.
    #[error("store error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Another order already holds this idempotency key.
    #[error("idempotency key already used")]
    DuplicateIdempotencyKey,
}

/// Result of a conditional take of spaces from one lesson.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TakeOutcome {
    /// The decrement was applied.
    Taken { remaining: Spaces },
    /// The lesson exists but has fewer spaces than requested; nothing changed.
    Insufficient { available: Spaces },
    /// No lesson with that id.
    Missing,
}

/// Lesson documents.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every lesson, ordered by id.
    async fn list_lessons(&self) -> StoreResult<Vec<Lesson>>;

    /// Lessons whose subject or location contains `term`, ordered by id.
    async fn search_lessons(&self, term: &SearchTerm) -> StoreResult<Vec<Lesson>>;

    async fn get_lesson(&self, id: LessonId) -> StoreResult<Option<Lesson>>;

    /// Overwrite the remaining count. Returns `false` when no lesson matched.
    async fn set_spaces(&self, id: LessonId, spaces: Spaces) -> StoreResult<bool>;

    /// Atomically decrement `spaces` by `quantity` only if `spaces >= quantity`.
    async fn take_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<TakeOutcome>;

    /// Atomically increment `spaces`. Returns `false` when no lesson matched.
    ///
    /// Compensation only; see `InventoryAdjuster`.
    async fn return_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<bool>;

    /// Insert lessons whose id is not catalogued yet; returns how many were added.
    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize>;
}

/// Order documents (append-only).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a validated order, assigning its id and creation time.
    ///
    /// Fails with [`StoreError::DuplicateIdempotencyKey`] when `key` is
    /// already taken.
    async fn insert_order(
        &self,
        order: NewOrder,
        key: Option<IdempotencyKey>,
    ) -> StoreResult<Order>;

    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn find_order_by_key(&self, key: &IdempotencyKey) -> StoreResult<Option<Order>>;
}

/// A complete backend: one client object injected into every component,
/// created at startup and closed on shutdown.
#[async_trait]
pub trait Store: CatalogStore + OrderStore {
    /// Short backend name for logs (`memory`, `postgres`).
    fn backend(&self) -> &'static str;

    /// Release connections. Further calls may fail with `Unavailable`.
    async fn close(&self) {}
}
