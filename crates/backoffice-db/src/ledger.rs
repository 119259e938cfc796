//! # Stock Ledger
//!
//! The only code that moves `products.stock`.
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock = stock - :qty                               │
//! │  WHERE id = :id AND stock >= :qty                                       │
//! │                                                                         │
//! │  rows_affected = 1  → reserved                                          │
//! │  rows_affected = 0  → re-read: missing product, or InsufficientStock    │
//! │                                                                         │
//! │  The guard is evaluated against the latest committed row, so two       │
//! │  transactions racing for the last unit cannot both succeed even if     │
//! │  both passed validation on an older read.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both primitives run on the caller's transaction connection and commit or
//! roll back with the rest of the operation.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::EngineResult;
use crate::repository::product::fetch_product;
use backoffice_core::CoreError;

/// Reserves `quantity` units. Returns the stock left.
pub async fn decrement(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> EngineResult<i64> {
    debug!(product_id, quantity, "Ledger decrement");

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        RETURNING stock
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = remaining {
        return Ok(stock);
    }

    match fetch_product(conn, product_id).await? {
        Some(product) => Err(CoreError::InsufficientStock {
            product_name: product.name,
            available: product.stock,
            requested: quantity,
        }
        .into()),
        None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
    }
}

/// Releases or restocks `quantity` units. Returns the new stock.
pub async fn increment(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> EngineResult<i64> {
    debug!(product_id, quantity, "Ledger increment");

    let stock: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1 RETURNING stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    stock.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::error::EngineError;
    use backoffice_core::NewProduct;

    async fn setup(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .catalog()
            .create_product(NewProduct {
                sku: "CAB-001".to_string(),
                name: "Cable".to_string(),
                description: None,
                price_cents: 500,
                stock,
                status: None,
            })
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_decrement_and_increment() {
        let (db, id) = setup(5).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert_eq!(decrement(&mut conn, &id, 3).await.unwrap(), 2);
        assert_eq!(increment(&mut conn, &id, 3).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() {
        let (db, id) = setup(2).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = decrement(&mut conn, &id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Business(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(decrement(&mut conn, &id, 2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (db, _) = setup(1).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(matches!(
            increment(&mut conn, "missing", 1).await,
            Err(EngineError::Business(CoreError::ProductNotFound(_)))
        ));
        assert!(matches!(
            decrement(&mut conn, "missing", 1).await,
            Err(EngineError::Business(CoreError::ProductNotFound(_)))
        ));
    }
}
