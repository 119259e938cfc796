//! # Product Repository
//!
//! Database operations for catalog rows.
//!
//! ## Read vs. Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRepository (pool)          reads for callers outside a          │
//! │    get_by_id / get_by_sku          transaction                          │
//! │    list_by_status / list_available                                      │
//! │    list_critical                                                        │
//! │                                                                         │
//! │  fetch_product / insert_product    run on the caller's connection, so   │
//! │  update_catalog_fields / set_status   a service can use them inside     │
//! │                                       its own transaction               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never written here. See `ledger`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::{Product, ProductStatus};

const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, price_cents, stock, status, created_at, updated_at";

/// Repository for product reads.
///
/// ## Usage
/// ```rust,ignore
/// let available = db.products().list_available().await?;
/// let laptop = db.products().get_by_sku("LAP-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products with the given status, by name.
    pub async fn list_by_status(&self, status: ProductStatus) -> DbResult<Vec<Product>> {
        debug!(status = %status, "Listing products by status");

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE status = ?1 ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists ACTIVE products with stock left, by name.
    pub async fn list_available(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = ?1 AND stock > 0 ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ProductStatus::Active)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists ACTIVE products with `stock <= threshold`, lowest stock first.
    pub async fn list_critical(&self, threshold: i64) -> DbResult<Vec<Product>> {
        debug!(threshold, "Listing critical stock products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE status = ?1 AND stock <= ?2 ORDER BY stock, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ProductStatus::Active)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Inserts a new product.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - SKU already exists
pub(crate) async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(sku = %product.sku, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, description, price_cents, stock, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.status)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes name, description, price and status. Stock is left alone.
pub(crate) async fn update_catalog_fields(
    conn: &mut SqliteConnection,
    product: &Product,
) -> DbResult<()> {
    debug!(id = %product.id, "Updating product");

    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = ?2,
            description = ?3,
            price_cents = ?4,
            status = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.status)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", &product.id));
    }

    Ok(())
}

pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: ProductStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
