//! Postgres-backed store implementation.
//!
//! Lessons and orders live in two tables (see `schema.sql`). Stock changes are
//! single conditional `UPDATE` statements, so concurrent reservations against
//! the same lesson serialize on the row lock and the `spaces >= $2` guard is
//! evaluated against the latest committed value.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `idempotency_key`) | `23505` | `DuplicateIdempotencyKey` |
//! | Database (other) | Any other | `Backend` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Unavailable` |
//! | ColumnDecode / Decode | N/A | `Corrupt` |
//! | Other | N/A | `Backend` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use lessonhub_catalog::{Lesson, SearchTerm, Spaces};
use lessonhub_core::{LessonId, OrderId};
use lessonhub_orders::{IdempotencyKey, NewOrder, Order, OrderItem, Quantity};

use super::{CatalogStore, OrderStore, Store, StoreError, StoreResult, TakeOutcome};

const SCHEMA: &str = include_str!("schema.sql");

const LESSON_COLUMNS: &str = "lesson_id, subject, location, price, spaces";
const ORDER_COLUMNS: &str =
    "order_id, customer_name, customer_phone, items, idempotency_key, created_at";

/// Postgres-backed lessons + orders store.
///
/// Uses a SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect eagerly so that an unreachable database fails startup.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn current_spaces(&self, id: LessonId) -> StoreResult<Option<Spaces>> {
        let row = sqlx::query("SELECT spaces FROM lessons WHERE lesson_id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("current_spaces", e))?;
        row.map(|r| decode_spaces(&r)).transpose()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip_all, err)]
    async fn list_lessons(&self) -> StoreResult<Vec<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons ORDER BY lesson_id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_lessons", e))?;
        rows.iter().map(decode_lesson).collect()
    }

    #[instrument(skip_all, fields(term = %term.as_str()), err)]
    async fn search_lessons(&self, term: &SearchTerm) -> StoreResult<Vec<Lesson>> {
        let sql = format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM lessons
            WHERE subject ILIKE $1 ESCAPE '\' OR location ILIKE $1 ESCAPE '\'
            ORDER BY lesson_id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(term.like_pattern())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("search_lessons", e))?;
        rows.iter().map(decode_lesson).collect()
    }

    #[instrument(skip_all, fields(lesson_id = %id), err)]
    async fn get_lesson(&self, id: LessonId) -> StoreResult<Option<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE lesson_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_lesson", e))?;
        row.as_ref().map(decode_lesson).transpose()
    }

    #[instrument(skip_all, fields(lesson_id = %id, spaces = %spaces), err)]
    async fn set_spaces(&self, id: LessonId, spaces: Spaces) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE lessons SET spaces = $2, updated_at = NOW() WHERE lesson_id = $1",
        )
        .bind(id.get())
        .bind(i64::from(spaces.get()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_spaces", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(lesson_id = %id, quantity = quantity.get()), err)]
    async fn take_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<TakeOutcome> {
        let row = sqlx::query(
            r#"
            UPDATE lessons
            SET spaces = spaces - $2, updated_at = NOW()
            WHERE lesson_id = $1 AND spaces >= $2
            RETURNING spaces
            "#,
        )
        .bind(id.get())
        .bind(i64::from(quantity.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("take_spaces", e))?;

        if let Some(row) = row {
            return Ok(TakeOutcome::Taken {
                remaining: decode_spaces(&row)?,
            });
        }

        // Nothing was updated; report why. This read never feeds a write.
        Ok(match self.current_spaces(id).await? {
            Some(available) => TakeOutcome::Insufficient { available },
            None => TakeOutcome::Missing,
        })
    }

    #[instrument(skip_all, fields(lesson_id = %id, quantity = quantity.get()), err)]
    async fn return_spaces(&self, id: LessonId, quantity: Quantity) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE lessons SET spaces = spaces + $2, updated_at = NOW() WHERE lesson_id = $1",
        )
        .bind(id.get())
        .bind(i64::from(quantity.get()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("return_spaces", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(count = lessons.len()), err)]
    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("seed_lessons", e))?;

        let mut added = 0usize;
        for lesson in lessons {
            let result = sqlx::query(
                r#"
                INSERT INTO lessons (lesson_id, subject, location, price, spaces)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (lesson_id) DO NOTHING
                "#,
            )
            .bind(lesson.id.get())
            .bind(&lesson.subject)
            .bind(&lesson.location)
            .bind(lesson.price)
            .bind(i64::from(lesson.spaces.get()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_lessons", e))?;
            added += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("seed_lessons", e))?;
        Ok(added)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip_all, fields(items = order.items.len()), err)]
    async fn insert_order(
        &self,
        order: NewOrder,
        key: Option<IdempotencyKey>,
    ) -> StoreResult<Order> {
        let order = order.into_order(OrderId::new(), key, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id,
                customer_name,
                customer_phone,
                items,
                idempotency_key,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(Json(&order.items))
        .bind(order.idempotency_key.as_ref().map(IdempotencyKey::as_str))
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateIdempotencyKey
            } else {
                map_sqlx_error("insert_order", e)
            }
        })?;

        Ok(order)
    }

    #[instrument(skip_all, fields(order_id = %id), err)]
    async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_order", e))?;
        row.as_ref().map(decode_order).transpose()
    }

    #[instrument(skip_all, err)]
    async fn find_order_by_key(&self, key: &IdempotencyKey) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = $1");
        let row = sqlx::query(&sql)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_order_by_key", e))?;
        row.as_ref().map(decode_order).transpose()
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_spaces(row: &PgRow) -> StoreResult<Spaces> {
    let raw: i64 = row
        .try_get("spaces")
        .map_err(|e| map_sqlx_error("decode_spaces", e))?;
    u32::try_from(raw)
        .map(Spaces::new)
        .map_err(|_| StoreError::Corrupt(format!("spaces out of range: {raw}")))
}

fn decode_lesson(row: &PgRow) -> StoreResult<Lesson> {
    let get = |e| map_sqlx_error("decode_lesson", e);
    Ok(Lesson {
        id: LessonId::new(row.try_get("lesson_id").map_err(get)?),
        subject: row.try_get("subject").map_err(get)?,
        location: row.try_get("location").map_err(get)?,
        price: row.try_get("price").map_err(get)?,
        spaces: decode_spaces(row)?,
    })
}

fn decode_order(row: &PgRow) -> StoreResult<Order> {
    let get = |e| map_sqlx_error("decode_order", e);
    let order_id: uuid::Uuid = row.try_get("order_id").map_err(get)?;
    let Json(items): Json<Vec<OrderItem>> = row.try_get("items").map_err(get)?;
    let key: Option<String> = row.try_get("idempotency_key").map_err(get)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get)?;

    let idempotency_key = key
        .map(|k| IdempotencyKey::parse(&k))
        .transpose()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(Order {
        id: OrderId::from_uuid(order_id),
        customer_name: row.try_get("customer_name").map_err(get)?,
        customer_phone: row.try_get("customer_phone").map_err(get)?,
        items,
        idempotency_key,
        created_at,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Map SQLx errors to `StoreError` (see the table in the module docs).
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        e @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            StoreError::Corrupt(format!("decode error in {operation}: {e}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
