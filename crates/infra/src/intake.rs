//! Order Intake: validate, reserve, persist.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use lessonhub_core::{DomainError, OrderId};
use lessonhub_orders::{IdempotencyKey, Order, OrderRequest};

use crate::error::{ServiceError, ServiceResult};
use crate::inventory::InventoryAdjuster;
use crate::store::{Store, StoreError};

/// Outcome of a successful [`OrderIntake::submit`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Submission {
    pub order_id: OrderId,
    /// `true` when the idempotency key matched an earlier order and nothing
    /// new was reserved or stored.
    pub replayed: bool,
}

pub struct OrderIntake<S: ?Sized> {
    store: Arc<S>,
    inventory: InventoryAdjuster<S>,
}

impl<S: ?Sized> Clone for OrderIntake<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

impl<S> OrderIntake<S>
where
    S: Store + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            inventory: InventoryAdjuster::new(store.clone()),
            store,
        }
    }

    /// Submit a purchase request.
    ///
    /// Stock is reserved before the order is stored. If the reservation fails
    /// nothing is stored; if storing fails the reservation is rolled back.
    #[instrument(skip_all, fields(idempotency_key = key.as_ref().map(IdempotencyKey::as_str)))]
    pub async fn submit(
        &self,
        request: OrderRequest,
        key: Option<IdempotencyKey>,
    ) -> ServiceResult<Submission> {
        let order = request.validate()?;

        if let Some(key) = &key {
            if let Some(existing) = self.store.find_order_by_key(key).await? {
                info!(order_id = %existing.id, "idempotent replay");
                return Ok(Submission {
                    order_id: existing.id,
                    replayed: true,
                });
            }
        }

        let reservation = self.inventory.reserve(&order.items).await?;

        match self.store.insert_order(order, key.clone()).await {
            Ok(stored) => {
                info!(
                    order_id = %stored.id,
                    lessons = reservation.items().len(),
                    spaces = stored.total_quantity(),
                    "order committed"
                );
                Ok(Submission {
                    order_id: stored.id,
                    replayed: false,
                })
            }
            Err(StoreError::DuplicateIdempotencyKey) => {
                // Lost a race with a concurrent submit carrying the same key.
                self.inventory.cancel(reservation).await;
                let existing = match &key {
                    Some(k) => self.store.find_order_by_key(k).await?,
                    None => None,
                };
                match existing {
                    Some(order) => {
                        info!(order_id = %order.id, "idempotent replay after concurrent submit");
                        Ok(Submission {
                            order_id: order.id,
                            replayed: true,
                        })
                    }
                    None => Err(ServiceError::Store(StoreError::Backend(
                        "idempotency key conflict without a stored order".to_string(),
                    ))),
                }
            }
            Err(e) => {
                warn!(error = %e, "order insert failed; releasing reservation");
                self.inventory.cancel(reservation).await;
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, id: OrderId) -> ServiceResult<Order> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id).into())
    }
}
