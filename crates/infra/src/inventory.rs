//! Inventory Adjuster: all-or-nothing stock reservation for one order.
//!
//! Each lesson is decremented with one conditional store operation
//! ([`CatalogStore::take_spaces`]). When any lesson in the order cannot be
//! satisfied, every decrement already applied for that order is released
//! before the error is returned, so a rejected order leaves no trace.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use lessonhub_core::{DomainError, LessonId};
use lessonhub_orders::{OrderItem, Quantity, merge_items};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CatalogStore, StoreResult, TakeOutcome};

/// Stock taken for one order that has not been rolled back.
///
/// Either hand it to [`InventoryAdjuster::cancel`] or let the order commit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a reservation must be committed or cancelled"]
pub struct Reservation {
    items: Vec<OrderItem>,
}

impl Reservation {
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
}

pub struct InventoryAdjuster<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for InventoryAdjuster<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> InventoryAdjuster<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Take stock for every item, or for none of them.
    ///
    /// Lines naming the same lesson are merged first so the floor check sees
    /// the whole demand. Fails with `InsufficientStock` or `NotFound` naming
    /// the first lesson that could not be satisfied.
    ///
    /// A store error on a take is returned after releasing the takes that
    /// were confirmed. The failed take itself is not released: the store may
    /// have applied it before the error (a timeout on the response, say), and
    /// releasing an unapplied take would mint spaces. Such a take leaks its
    /// quantity. It is logged at `error` with the lesson id and quantity, and
    /// the count must be checked and corrected with `PUT /lessons/:id`.
    pub async fn reserve(&self, items: &[OrderItem]) -> ServiceResult<Reservation> {
        let wanted = merge_items(items);
        let mut applied: Vec<OrderItem> = Vec::with_capacity(wanted.len());

        for item in wanted {
            let outcome = match self.store.take_spaces(item.lesson_id, item.quantity).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // The failed take may or may not have landed; only the
                    // confirmed ones are compensated.
                    error!(
                        lesson_id = %item.lesson_id,
                        quantity = item.quantity.get(),
                        error = %e,
                        "stock take failed; spaces may need manual correction"
                    );
                    self.rollback(&applied).await;
                    return Err(e.into());
                }
            };

            match outcome {
                TakeOutcome::Taken { remaining } => {
                    debug!(
                        lesson_id = %item.lesson_id,
                        quantity = item.quantity.get(),
                        remaining = remaining.get(),
                        "spaces taken"
                    );
                    applied.push(item);
                }
                TakeOutcome::Insufficient { available } => {
                    info!(
                        lesson_id = %item.lesson_id,
                        requested = item.quantity.get(),
                        available = available.get(),
                        "reservation rejected: insufficient stock"
                    );
                    self.rollback(&applied).await;
                    return Err(ServiceError::Domain(DomainError::insufficient_stock(
                        item.lesson_id.get(),
                        item.quantity.get(),
                        available.get(),
                    )));
                }
                TakeOutcome::Missing => {
                    info!(lesson_id = %item.lesson_id, "reservation rejected: unknown lesson");
                    self.rollback(&applied).await;
                    return Err(ServiceError::Domain(DomainError::not_found(
                        "lesson",
                        item.lesson_id,
                    )));
                }
            }
        }

        Ok(Reservation { items: applied })
    }

    /// Give back everything a reservation took.
    pub(crate) async fn cancel(&self, reservation: Reservation) {
        self.rollback(&reservation.items).await;
    }

    /// Compensating increment for one lesson.
    pub(crate) async fn release(&self, lesson_id: LessonId, quantity: Quantity) -> StoreResult<()> {
        if !self.store.return_spaces(lesson_id, quantity).await? {
            warn!(%lesson_id, quantity = quantity.get(), "release matched no lesson");
        }
        Ok(())
    }

    async fn rollback(&self, applied: &[OrderItem]) {
        if applied.is_empty() {
            return;
        }
        info!(lessons = applied.len(), "rolling back reservation");
        for item in applied.iter().rev() {
            if let Err(e) = self.release(item.lesson_id, item.quantity).await {
                // Nothing left to compensate with; the shortfall must be
                // repaired by an operator via `PUT /lessons/:id`.
                error!(
                    lesson_id = %item.lesson_id,
                    quantity = item.quantity.get(),
                    error = %e,
                    "failed to release reserved spaces"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lessonhub_catalog::{Lesson, SearchTerm, Spaces};
    use lessonhub_core::LessonId;

    use crate::store::{InMemoryStore, StoreError};

    fn item(lesson_id: i64, quantity: u32) -> OrderItem {
        OrderItem {
            lesson_id: LessonId::new(lesson_id),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    fn setup() -> (Arc<InMemoryStore>, InventoryAdjuster<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::with_lessons([
            Lesson::new(1, "Math", "Room A", 100.0, 2),
            Lesson::new(2, "English", "Room B", 80.0, 1),
            Lesson::new(3, "Music", "Hall", 70.0, 4),
        ]));
        (store.clone(), InventoryAdjuster::new(store))
    }

    async fn spaces(store: &InMemoryStore, id: i64) -> u32 {
        store
            .get_lesson(LessonId::new(id))
            .await
            .unwrap()
            .unwrap()
            .spaces
            .get()
    }

    #[tokio::test]
    async fn reserve_decrements_every_lesson() {
        let (store, adjuster) = setup();
        let reservation = adjuster.reserve(&[item(1, 2), item(3, 1)]).await.unwrap();
        assert_eq!(reservation.items().len(), 2);
        assert_eq!(spaces(&store, 1).await, 0);
        assert_eq!(spaces(&store, 3).await, 3);
    }

    #[tokio::test]
    async fn shortfall_rolls_back_earlier_lessons() {
        let (store, adjuster) = setup();
        let err = adjuster
            .reserve(&[item(1, 1), item(3, 2), item(2, 5)])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::Domain(DomainError::insufficient_stock(2, 5, 1))
        );
        assert_eq!(spaces(&store, 1).await, 2);
        assert_eq!(spaces(&store, 2).await, 1);
        assert_eq!(spaces(&store, 3).await, 4);
    }

    #[tokio::test]
    async fn unknown_lesson_rolls_back_and_reports_not_found() {
        let (store, adjuster) = setup();
        let err = adjuster.reserve(&[item(1, 1), item(42, 1)]).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("lesson", 42)));
        assert_eq!(spaces(&store, 1).await, 2);
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_as_one_demand() {
        let (store, adjuster) = setup();
        let err = adjuster.reserve(&[item(1, 1), item(1, 2)]).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::insufficient_stock(1, 3, 2)));
        assert_eq!(spaces(&store, 1).await, 2);
    }

    #[tokio::test]
    async fn cancel_restores_stock() {
        let (store, adjuster) = setup();
        let reservation = adjuster.reserve(&[item(1, 2), item(2, 1)]).await.unwrap();
        adjuster.cancel(reservation).await;
        assert_eq!(spaces(&store, 1).await, 2);
        assert_eq!(spaces(&store, 2).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_for_last_unit_have_one_winner() {
        let (store, adjuster) = setup();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let adjuster = adjuster.clone();
            handles.push(tokio::spawn(async move { adjuster.reserve(&[item(2, 1)]).await }));
        }

        let mut won = 0;
        let mut rejected = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => won += 1,
                Err(ServiceError::Domain(DomainError::InsufficientStock { lesson_id: 2, .. })) => {
                    rejected += 1
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(rejected, 7);
        assert_eq!(
            store.get_lesson(LessonId::new(2)).await.unwrap().unwrap().spaces,
            Spaces::ZERO
        );
    }

    /// Memory-backed catalog whose stock take fails for one lesson.
    struct FailingTake {
        inner: Arc<InMemoryStore>,
        fail_on: LessonId,
    }

    #[async_trait]
    impl CatalogStore for FailingTake {
        async fn list_lessons(&self) -> StoreResult<Vec<Lesson>> {
            self.inner.list_lessons().await
        }
        async fn search_lessons(&self, term: &SearchTerm) -> StoreResult<Vec<Lesson>> {
            self.inner.search_lessons(term).await
        }
        async fn get_lesson(&self, id: LessonId) -> StoreResult<Option<Lesson>> {
            self.inner.get_lesson(id).await
        }
        async fn set_spaces(&self, id: LessonId, spaces: Spaces) -> StoreResult<bool> {
            self.inner.set_spaces(id, spaces).await
        }
        async fn take_spaces(&self, id: LessonId, q: Quantity) -> StoreResult<TakeOutcome> {
            if id == self.fail_on {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.take_spaces(id, q).await
        }
        async fn return_spaces(&self, id: LessonId, q: Quantity) -> StoreResult<bool> {
            self.inner.return_spaces(id, q).await
        }
        async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize> {
            self.inner.seed_lessons(lessons).await
        }
    }

    #[tokio::test]
    async fn store_error_mid_order_releases_earlier_lessons() {
        let (store, _) = setup();
        let adjuster = InventoryAdjuster::new(Arc::new(FailingTake {
            inner: store.clone(),
            fail_on: LessonId::new(2),
        }));

        let err = adjuster
            .reserve(&[item(1, 2), item(2, 1), item(3, 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
        assert_eq!(spaces(&store, 1).await, 2);
        assert_eq!(spaces(&store, 2).await, 1);
        assert_eq!(spaces(&store, 3).await, 4);
    }
}
