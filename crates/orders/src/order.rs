use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lessonhub_core::{DomainError, DomainResult, Entity, LessonId, OrderId, ValueObject};

/// Number of spaces requested for one lesson. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    fn parse(field: &str, value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation(field, "quantity must be a positive integer"));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::validation(field, "quantity is too large"))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::parse("quantity", value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl ValueObject for Quantity {}

/// One validated order line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub lesson_id: LessonId,
    pub quantity: Quantity,
}

impl ValueObject for OrderItem {}

/// Collapse lines naming the same lesson into one, summing quantities.
///
/// First-seen order of lessons is preserved.
pub fn merge_items(items: &[OrderItem]) -> Vec<OrderItem> {
    let mut merged: Vec<OrderItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.lesson_id == item.lesson_id) {
            Some(existing) => {
                existing.quantity = Quantity(existing.quantity.0.saturating_add(item.quantity.0));
            }
            None => merged.push(*item),
        }
    }
    merged
}

/// Client-supplied key that makes a submission safe to retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub const FIELD: &'static str = "Idempotency-Key";
    pub const MAX_LEN: usize = 255;

    pub fn parse(raw: &str) -> DomainResult<Self> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(DomainError::validation(Self::FIELD, "cannot be empty"));
        }
        if key.len() > Self::MAX_LEN {
            return Err(DomainError::validation(
                Self::FIELD,
                format!("cannot exceed {} characters", Self::MAX_LEN),
            ));
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(DomainError::validation(
                Self::FIELD,
                "must contain printable ASCII only",
            ));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for IdempotencyKey {}

/// Order line as received on the wire (unvalidated).
///
/// Values are kept as raw JSON so that a wrong type is reported against the
/// field that carries it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub lesson_id: Option<Value>,
    pub quantity: Option<Value>,
}

/// Purchase request as received on the wire (unvalidated).
///
/// Everything is optional and untyped so that a missing or mistyped field is
/// reported by name instead of as an opaque deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_name: Option<Value>,
    pub customer_phone: Option<Value>,
    pub items: Option<Value>,
}

impl OrderRequest {
    /// Check shape and produce a [`NewOrder`].
    ///
    /// Fields are checked in order: `customerName`, `customerPhone`, `items`,
    /// then each line. The first failure is returned.
    pub fn validate(self) -> DomainResult<NewOrder> {
        let customer_name = required_text("customerName", self.customer_name)?;
        let customer_phone = required_text("customerPhone", self.customer_phone)?;

        let raw_items = match self.items {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(lines)) => lines,
            Some(_) => return Err(DomainError::validation("items", "must be an array")),
        };
        if raw_items.is_empty() {
            return Err(DomainError::validation("items", "order must contain at least one item"));
        }

        let mut items = Vec::with_capacity(raw_items.len());
        for (idx, raw) in raw_items.into_iter().enumerate() {
            if !raw.is_object() {
                return Err(DomainError::validation(format!("items[{idx}]"), "must be an object"));
            }
            let line: OrderItemRequest = serde_json::from_value(raw).map_err(|_| {
                DomainError::validation(format!("items[{idx}]"), "must be an object")
            })?;

            let lesson_id = parse_lesson_id(&format!("items[{idx}].lessonId"), line.lesson_id)?;
            let quantity = parse_quantity(&format!("items[{idx}].quantity"), line.quantity)?;
            items.push(OrderItem {
                lesson_id,
                quantity,
            });
        }

        Ok(NewOrder {
            customer_name,
            customer_phone,
            items,
        })
    }
}

fn required_text(field: &str, value: Option<Value>) -> DomainResult<String> {
    match value {
        Some(Value::String(v)) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        None | Some(Value::Null) => Err(DomainError::validation(field, "is required")),
        Some(_) => Err(DomainError::validation(field, "must be a non-empty string")),
    }
}

fn parse_lesson_id(field: &str, value: Option<Value>) -> DomainResult<LessonId> {
    match value {
        None | Some(Value::Null) => Err(DomainError::validation(field, "is required")),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(LessonId::new)
            .ok_or_else(|| DomainError::validation(field, "must be an integer")),
        Some(_) => Err(DomainError::validation(field, "must be an integer")),
    }
}

fn parse_quantity(field: &str, value: Option<Value>) -> DomainResult<Quantity> {
    match value {
        None | Some(Value::Null) => Err(DomainError::validation(field, "is required")),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Quantity::parse(field, v),
            None if n.is_u64() => Err(DomainError::validation(field, "quantity is too large")),
            None => Err(DomainError::validation(field, "quantity must be a positive integer")),
        },
        Some(_) => Err(DomainError::validation(field, "quantity must be a positive integer")),
    }
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    /// Stamp identity and creation time; the result is immutable.
    pub fn into_order(
        self,
        id: OrderId,
        idempotency_key: Option<IdempotencyKey>,
        created_at: DateTime<Utc>,
    ) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            items: self.items,
            idempotency_key,
            created_at,
        }
    }
}

/// A committed order. There is no update or cancel path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.get())).sum()
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
