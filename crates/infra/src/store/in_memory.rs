use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use lessonhub_catalog::{Lesson, SearchTerm, Spaces};
use lessonhub_core::{LessonId, OrderId};
use lessonhub_orders::{IdempotencyKey, NewOrder, Order, Quantity};

use super::{CatalogStore, OrderStore, Store, StoreError, StoreResult, TakeOutcome};

#[derive(Debug, Default)]
struct OrderTable {
    by_id: HashMap<OrderId, Order>,
    by_key: HashMap<IdempotencyKey, OrderId>,
}

/// In-memory store for tests/dev.
///
/// Each lesson mutation happens under a single write lock, which gives the
/// same check-and-decrement atomicity as a conditional update in a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lessons: RwLock<BTreeMap<LessonId, Lesson>>,
    orders: RwLock<OrderTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lessons(lessons: impl IntoIterator<Item = Lesson>) -> Self {
        let map = lessons.into_iter().map(|l| (l.id, l)).collect();
        Self {
            lessons: RwLock::new(map),
            orders: RwLock::new(OrderTable::default()),
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().map(|t| t.by_id.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_lessons(&self) -> StoreResult<Vec<Lesson>> {
        let map = self.lessons.read().map_err(poisoned)?;
        Ok(map.values().cloned().collect())
    }

    async fn search_lessons(&self, term: &SearchTerm) -> StoreResult<Vec<Lesson>> {
        let map = self.lessons.read().map_err(poisoned)?;
        Ok(term.filter(map.values()))
    }

    async fn get_lesson(&self, id: LessonId) -> StoreResult<Option<Lesson>> {
        let map = self.lessons.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn set_spaces(&self, id: LessonId, spaces: Spaces) -> StoreResult<bool> {
        let mut map = self.lessons.write().map_err(poisoned)?;
        match map.get_mut(&id) {
            Some(lesson) => {
                lesson.spaces = spaces;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn take_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<TakeOutcome> {
        let mut map = self.lessons.write().map_err(poisoned)?;
        let Some(lesson) = map.get_mut(&id) else {
            return Ok(TakeOutcome::Missing);
        };
        let available = lesson.spaces;
        Ok(match lesson.take_spaces(quantity.get()) {
            Ok(remaining) => TakeOutcome::Taken { remaining },
            Err(_) => TakeOutcome::Insufficient { available },
        })
    }

    async fn return_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<bool> {
        let mut map = self.lessons.write().map_err(poisoned)?;
        match map.get_mut(&id) {
            Some(lesson) => {
                lesson.return_spaces(quantity.get());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize> {
        let mut map = self.lessons.write().map_err(poisoned)?;
        let mut added = 0;
        for lesson in lessons {
            if !map.contains_key(&lesson.id) {
                map.insert(lesson.id, lesson.clone());
                added += 1;
            }
        }
        Ok(added)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(
        &self,
        order: NewOrder,
        key: Option<IdempotencyKey>,
    ) -> StoreResult<Order> {
        let mut table = self.orders.write().map_err(poisoned)?;
        if let Some(k) = &key {
            if table.by_key.contains_key(k) {
                return Err(StoreError::DuplicateIdempotencyKey);
            }
        }

        let order = order.into_order(OrderId::new(), key, Utc::now());
        if let Some(k) = &order.idempotency_key {
            table.by_key.insert(k.clone(), order.id);
        }
        table.by_id.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let table = self.orders.read().map_err(poisoned)?;
        Ok(table.by_id.get(&id).cloned())
    }

    async fn find_order_by_key(&self, key: &IdempotencyKey) -> StoreResult<Option<Order>> {
        let table = self.orders.read().map_err(poisoned)?;
        Ok(table
            .by_key
            .get(key)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}
