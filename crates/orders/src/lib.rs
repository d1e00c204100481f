//! Order intake domain module.
//!
//! Request validation and the immutable order record. Reserving stock and
//! persisting orders happen in `lessonhub-infra`.

pub mod order;

pub use order::{
    IdempotencyKey, NewOrder, Order, OrderItem, OrderItemRequest, OrderRequest, Quantity,
    merge_items,
};
