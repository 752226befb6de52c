//! Order repository.
//!
//! Orders are stored as JSON documents keyed by order number. Writes are
//! upserts: the incoming top-level fields overwrite the stored ones, fields the
//! incoming record does not carry are kept, and `updatedAt` is stamped with the
//! server time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use bazaar_core::{OrderNumber, OrderStatus};

use super::RepositoryError;

/// A JSON object holding one order.
pub type Document = Map<String, Value>;

/// An order as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub document: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or merge an order.
    ///
    /// Runs in a single `BEGIN IMMEDIATE` transaction so concurrent upserts
    /// queue on the write lock instead of failing when a read lock cannot be
    /// upgraded. See [`merge_document`] for the merge rules.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row cannot be
    /// decoded.
    #[instrument(skip(self, incoming), fields(order_number = %order_number))]
    pub async fn upsert(
        &self,
        order_number: &OrderNumber,
        incoming: Document,
        now: DateTime<Utc>,
    ) -> Result<StoredOrder, RepositoryError> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let row = sqlx::query("SELECT document, created_at FROM orders WHERE order_number = ?")
            .bind(order_number.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let (existing, created_at) = match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                let created_at: String = row.try_get("created_at")?;
                (Some(parse_document(&document)?), parse_timestamp(&created_at)?)
            }
            None => (None, now),
        };
        let is_new = existing.is_none();

        let document = merge_document(existing, incoming, now);
        let status = document_status(&document)?;
        let encoded = serde_json::to_string(&document)
            .map_err(|e| RepositoryError::DataCorruption(format!("unencodable order: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO orders (order_number, status, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (order_number) DO UPDATE SET
                status = excluded.status,
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(order_number.as_str())
        .bind(status.to_string())
        .bind(&encoded)
        .bind(format_timestamp(created_at))
        .bind(format_timestamp(now))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(%status, is_new, "Order upserted");

        Ok(StoredOrder {
            order_number: order_number.clone(),
            status,
            document,
            created_at,
            updated_at: now,
        })
    }

    /// Get an order by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row cannot be
    /// decoded.
    pub async fn get(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<StoredOrder>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT order_number, status, document, created_at, updated_at
            FROM orders
            WHERE order_number = ?
            ",
        )
        .bind(order_number.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            let number: String = row.try_get("order_number")?;
            let status: String = row.try_get("status")?;
            let document: String = row.try_get("document")?;
            let created_at: String = row.try_get("created_at")?;
            let updated_at: String = row.try_get("updated_at")?;

            Ok(StoredOrder {
                order_number: OrderNumber::new(number),
                status: status.parse().map_err(RepositoryError::DataCorruption)?,
                document: parse_document(&document)?,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            })
        })
        .transpose()
    }

    /// Number of stored orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Merge rules
// =============================================================================

/// Merge an incoming order document over the stored one.
///
/// - every top-level field of `incoming` replaces the stored field
/// - stored fields absent from `incoming` are kept
/// - a stored `confirmed` status is never replaced by `pending`, since pushes
///   can arrive out of order
/// - `updatedAt` is set to `now`
#[must_use]
pub fn merge_document(
    existing: Option<Document>,
    mut incoming: Document,
    now: DateTime<Utc>,
) -> Document {
    let mut merged = existing.unwrap_or_default();

    let stored_confirmed = status_field(&merged) == Some(OrderStatus::Confirmed);
    if stored_confirmed && status_field(&incoming) != Some(OrderStatus::Confirmed) {
        incoming.remove("status");
    }

    merged.extend(incoming);
    merged.insert(
        "updatedAt".to_owned(),
        Value::String(format_timestamp(now)),
    );
    merged
}

fn status_field(document: &Document) -> Option<OrderStatus> {
    document
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Status of a merged document; a document without one is pending.
fn document_status(document: &Document) -> Result<OrderStatus, RepositoryError> {
    match document.get("status") {
        None | Some(Value::Null) => Ok(OrderStatus::Pending),
        Some(Value::String(s)) => s.parse().map_err(RepositoryError::DataCorruption),
        Some(other) => Err(RepositoryError::DataCorruption(format!(
            "invalid status value: {other}"
        ))),
    }
}

fn parse_document(text: &str) -> Result<Document, RepositoryError> {
    serde_json::from_str(text)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid order document: {e}")))
}

/// RFC 3339 with millisecond precision, matching the client's timestamps.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid timestamp '{text}': {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::db::{create_pool, migrate};

    async fn pool() -> SqlitePool {
        let pool = create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap()
    }

    #[test]
    fn test_merge_overwrites_and_preserves() {
        let stored = doc(json!({"orderNumber": "ORD-1", "total": "200.00", "note": "keep"}));
        let incoming = doc(json!({"orderNumber": "ORD-1", "total": "250.00"}));

        let merged = merge_document(Some(stored), incoming, at(5));
        assert_eq!(merged["total"], "250.00");
        assert_eq!(merged["note"], "keep");
        assert_eq!(merged["updatedAt"], "2025-03-01T10:05:00.000Z");
    }

    #[test]
    fn test_merge_never_downgrades_confirmed() {
        let stored = doc(json!({"status": "confirmed", "paidAt": "2025-03-01T10:01:00.000Z"}));
        let incoming = doc(json!({"status": "pending", "total": "10.00"}));

        let merged = merge_document(Some(stored), incoming, at(2));
        assert_eq!(merged["status"], "confirmed");
        assert_eq!(merged["paidAt"], "2025-03-01T10:01:00.000Z");
        assert_eq!(merged["total"], "10.00");
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_merges() {
        let pool = pool().await;
        let repo = OrderRepository::new(&pool);
        let number = OrderNumber::new("ORD-1-ABC");

        let first = repo
            .upsert(&number, doc(json!({"orderNumber": "ORD-1-ABC", "status": "pending", "items": []})), at(0))
            .await
            .unwrap();
        assert_eq!(first.status, OrderStatus::Pending);

        let second = repo
            .upsert(&number, doc(json!({"orderNumber": "ORD-1-ABC", "status": "confirmed"})), at(3))
            .await
            .unwrap();
        assert_eq!(second.status, OrderStatus::Confirmed);
        assert_eq!(second.created_at, at(0));
        assert_eq!(second.document["items"], json!([]));

        assert_eq!(repo.count().await.unwrap(), 1);

        let stored = repo.get(&number).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert_eq!(stored.updated_at, at(3));
        assert_eq!(stored.document["updatedAt"], "2025-03-01T10:03:00.000Z");
    }

    #[tokio::test]
    async fn test_concurrent_upserts_on_file_database_all_succeed() {
        let path = std::env::temp_dir().join(format!("bazaar-orders-{}.db", uuid::Uuid::new_v4()));
        let url = SecretString::from(format!("sqlite://{}", path.display()));
        let pool = create_pool(&url).await.unwrap();
        migrate(&pool).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20_u32 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let status = if i % 2 == 0 { "pending" } else { "confirmed" };
                OrderRepository::new(&pool)
                    .upsert(
                        &OrderNumber::new("ORD-RACE"),
                        doc(json!({"orderNumber": "ORD-RACE", "status": status})),
                        at(i),
                    )
                    .await
                    .map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let repo = OrderRepository::new(&pool);
        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.get(&OrderNumber::new("ORD-RACE")).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);

        pool.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let pool = pool().await;
        let repo = OrderRepository::new(&pool);
        assert!(repo.get(&OrderNumber::new("ORD-NOPE")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_rejects_unknown_status() {
        let pool = pool().await;
        let repo = OrderRepository::new(&pool);
        let result = repo
            .upsert(&OrderNumber::new("ORD-2"), doc(json!({"status": "shipped"})), at(0))
            .await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }
}
