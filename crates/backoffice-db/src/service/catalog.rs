//! Catalog operations: creating and editing products, restocking.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger;
use crate::repository::product::{
    fetch_product, generate_product_id, insert_product, set_status, update_catalog_fields,
    ProductRepository,
};
use crate::service::{begin_write, log_failure};
use backoffice_core::validation::{
    validate_price_cents, validate_product_name, validate_sku, validate_stock_level,
};
use backoffice_core::{
    CoreError, NewProduct, Product, ProductStatus, ProductUpdate, ValidationError,
};

/// Product lifecycle and restocking.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
    config: EngineConfig,
}

impl CatalogService {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        CatalogService { pool, config }
    }

    fn repository(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Creates a product.
    ///
    /// Status defaults to ACTIVE; a product created with zero stock is
    /// OUT_OF_STOCK.
    pub async fn create_product(&self, new: NewProduct) -> EngineResult<Product> {
        self.create_product_tx(new)
            .await
            .inspect_err(|err| log_failure("create_product", err))
    }

    async fn create_product_tx(&self, new: NewProduct) -> EngineResult<Product> {
        validate_sku(&new.sku)?;
        validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        validate_stock_level("stock", new.stock)?;

        let mut tx = begin_write(&self.pool).await?;

        let sku = new.sku.trim().to_string();
        let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE sku = ?1")
            .bind(&sku)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Err(ValidationError::Duplicate {
                field: "sku".to_string(),
                value: sku,
            }
            .into());
        }

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            status: new.initial_status(),
            sku,
            name: new.name.trim().to_string(),
            description: new.description,
            price_cents: new.price_cents,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };

        insert_product(&mut tx, &product).await?;
        tx.commit().await?;

        info!(
            product_id = %product.id,
            sku = %product.sku,
            stock = product.stock,
            status = %product.status,
            "Product created"
        );
        Ok(product)
    }

    /// Updates catalog fields. Stock only moves through `restock_product`
    /// and the order operations.
    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> EngineResult<Product> {
        self.update_product_tx(id, update)
            .await
            .inspect_err(|err| log_failure("update_product", err))
    }

    async fn update_product_tx(&self, id: &str, update: ProductUpdate) -> EngineResult<Product> {
        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(price_cents) = update.price_cents {
            validate_price_cents(price_cents)?;
        }

        let mut tx = begin_write(&self.pool).await?;
        let mut product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        product.apply_update(update, Utc::now());
        update_catalog_fields(&mut tx, &product).await?;
        tx.commit().await?;

        info!(product_id = %product.id, status = %product.status, "Product updated");
        Ok(product)
    }

    /// ACTIVE → INACTIVE; any other status → ACTIVE.
    pub async fn toggle_product_status(&self, id: &str) -> EngineResult<Product> {
        self.toggle_product_status_tx(id)
            .await
            .inspect_err(|err| log_failure("toggle_product_status", err))
    }

    async fn toggle_product_status_tx(&self, id: &str) -> EngineResult<Product> {
        let mut tx = begin_write(&self.pool).await?;
        let mut product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let previous = product.status;
        product.status = previous.toggled();
        product.updated_at = Utc::now();
        set_status(&mut tx, id, product.status, product.updated_at).await?;
        tx.commit().await?;

        info!(product_id = %id, from = %previous, to = %product.status, "Product status toggled");
        Ok(product)
    }

    /// Adds `units` to stock through the ledger.
    ///
    /// An OUT_OF_STOCK product that ends up with stock goes back to ACTIVE.
    pub async fn restock_product(&self, id: &str, units: i64) -> EngineResult<Product> {
        self.restock_product_tx(id, units)
            .await
            .inspect_err(|err| log_failure("restock_product", err))
    }

    async fn restock_product_tx(&self, id: &str, units: i64) -> EngineResult<Product> {
        validate_stock_level("units", units)?;

        let mut tx = begin_write(&self.pool).await?;
        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let stock = ledger::increment(&mut tx, id, units).await?;
        if product.status == ProductStatus::OutOfStock && stock > 0 {
            set_status(&mut tx, id, ProductStatus::Active, Utc::now()).await?;
        }

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        tx.commit().await?;

        info!(product_id = %id, units, stock, status = %product.status, "Product restocked");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> EngineResult<Product> {
        self.repository()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::ProductNotFound(id.to_string())))
    }

    pub async fn find_product_by_sku(&self, sku: &str) -> EngineResult<Option<Product>> {
        Ok(self.repository().get_by_sku(sku).await?)
    }

    /// ACTIVE products with stock left.
    pub async fn list_available_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.repository().list_available().await?)
    }

    pub async fn list_products_by_status(&self, status: ProductStatus) -> EngineResult<Vec<Product>> {
        Ok(self.repository().list_by_status(status).await?)
    }

    /// ACTIVE with stock > 0. A missing product is simply not available.
    pub async fn is_product_available(&self, id: &str) -> EngineResult<bool> {
        let product = self.repository().get_by_id(id).await?;
        Ok(product.map(|p| p.is_available()).unwrap_or(false))
    }

    /// Stock at or below the configured critical threshold.
    pub fn is_stock_critical(&self, product: &Product) -> bool {
        product.is_stock_critical(self.config.stock_policy.critical_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(sku: &str, stock: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: Some("demo".to_string()),
            price_cents: 2500,
            stock,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = setup().await;
        let created = db.catalog().create_product(new_product("KB-01", 7)).await.unwrap();

        assert_eq!(created.status, ProductStatus::Active);
        let loaded = db.catalog().get_product(&created.id).await.unwrap();
        assert_eq!(loaded.sku, "KB-01");
        assert_eq!(loaded.stock, 7);
        assert_eq!(loaded.price_cents, 2500);

        let by_sku = db.catalog().find_product_by_sku("KB-01").await.unwrap();
        assert_eq!(by_sku.map(|p| p.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = setup().await;
        let catalog = db.catalog();

        let mut bad = new_product("KB-02", 1);
        bad.price_cents = 0;
        assert!(matches!(
            catalog.create_product(bad).await,
            Err(EngineError::Business(CoreError::Validation(_)))
        ));

        let mut bad = new_product("KB-03", 1);
        bad.name = "  ".to_string();
        assert!(catalog.create_product(bad).await.is_err());

        assert!(catalog.create_product(new_product("KB-04", -1)).await.is_err());

        catalog.create_product(new_product("KB-05", 1)).await.unwrap();
        assert!(matches!(
            catalog.create_product(new_product("KB-05", 1)).await,
            Err(EngineError::Business(CoreError::Validation(ValidationError::Duplicate { .. })))
        ));
    }

    #[tokio::test]
    async fn test_zero_stock_product_is_out_of_stock() {
        let db = setup().await;
        let product = db.catalog().create_product(new_product("EMPTY", 0)).await.unwrap();
        assert_eq!(product.status, ProductStatus::OutOfStock);
        assert!(!db.catalog().is_product_available(&product.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_product_keeps_stock() {
        let db = setup().await;
        let product = db.catalog().create_product(new_product("UPD-1", 4)).await.unwrap();

        let updated = db
            .catalog()
            .update_product(
                &product.id,
                ProductUpdate {
                    name: Some("Renamed".to_string()),
                    price_cents: Some(3000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.stock, 4);
        assert_eq!(updated.status, ProductStatus::Active);
        assert_eq!(db.catalog().get_product(&product.id).await.unwrap().price_cents, 3000);

        assert!(matches!(
            db.catalog().update_product("missing", ProductUpdate::default()).await,
            Err(EngineError::Business(CoreError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_toggle_status() {
        let db = setup().await;
        let product = db.catalog().create_product(new_product("TOG-1", 2)).await.unwrap();

        let toggled = db.catalog().toggle_product_status(&product.id).await.unwrap();
        assert_eq!(toggled.status, ProductStatus::Inactive);
        assert!(!db.catalog().is_product_available(&product.id).await.unwrap());

        let toggled = db.catalog().toggle_product_status(&product.id).await.unwrap();
        assert_eq!(toggled.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn test_restock_reactivates_out_of_stock_product() {
        let db = setup().await;
        let product = db.catalog().create_product(new_product("RST-1", 0)).await.unwrap();

        let restocked = db.catalog().restock_product(&product.id, 5).await.unwrap();
        assert_eq!(restocked.stock, 5);
        assert_eq!(restocked.status, ProductStatus::Active);

        assert!(db.catalog().restock_product(&product.id, -2).await.is_err());
        assert_eq!(db.catalog().get_product(&product.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_listings() {
        let db = setup().await;
        let catalog = db.catalog();
        catalog.create_product(new_product("A-1", 3)).await.unwrap();
        catalog.create_product(new_product("A-2", 0)).await.unwrap();
        let hidden = catalog.create_product(new_product("A-3", 9)).await.unwrap();
        catalog.toggle_product_status(&hidden.id).await.unwrap();

        let available = catalog.list_available_products().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].sku, "A-1");
        assert!(catalog.is_stock_critical(&available[0]));

        let inactive = catalog
            .list_products_by_status(ProductStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, hidden.id);

        assert!(!catalog.is_product_available("missing").await.unwrap());
    }
}
