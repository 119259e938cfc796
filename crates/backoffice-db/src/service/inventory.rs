//! # Inventory Checks
//!
//! Read-only stock validation over stored products and line items.
//!
//! ## Down-conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per check                                                              │
//! │    Ok(verdict)                    → result as classified                │
//! │    Business(ProductNotFound ...)  → invalid result, message = error    │
//! │    Storage(...)                   → whole call fails with the error    │
//! │                                                                         │
//! │  A storage failure is never reported as "insufficient stock".           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::repository::order::fetch_line_item;
use crate::repository::product::{fetch_product, ProductRepository};
use crate::service::log_failure;
use backoffice_core::validation::validate_quantity;
use backoffice_core::{
    BulkValidationReport, CoreError, Product, Reservation, StockCheck, StockValidation,
};

/// Stock validation entry points.
#[derive(Debug, Clone)]
pub struct InventoryService {
    pool: SqlitePool,
    config: EngineConfig,
}

impl InventoryService {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        InventoryService { pool, config }
    }

    /// Checks whether `quantity` units of a product can be reserved.
    ///
    /// With `line_item_id`, the check is for editing that line item: its
    /// current quantity counts as available. Business failures come back as
    /// an invalid result, storage failures as `Err`.
    pub async fn validate_stock(
        &self,
        product_id: &str,
        quantity: i64,
        line_item_id: Option<&str>,
    ) -> EngineResult<StockValidation> {
        let check = StockCheck {
            product_id: product_id.to_string(),
            quantity,
            line_item_id: line_item_id.map(str::to_string),
        };

        let mut conn = self.pool.acquire().await?;
        let result = self
            .check_one(&mut conn, &check)
            .await
            .inspect_err(|err| log_failure("validate_stock", err))?;

        debug!(product_id, quantity, valid = result.valid, "Stock validated");
        Ok(result)
    }

    /// Runs `validate_stock` over a batch, in request order.
    pub async fn validate_stock_bulk(
        &self,
        checks: &[StockCheck],
    ) -> EngineResult<BulkValidationReport> {
        let mut conn = self.pool.acquire().await?;
        let mut results = Vec::with_capacity(checks.len());

        for check in checks {
            let result = self
                .check_one(&mut conn, check)
                .await
                .inspect_err(|err| log_failure("validate_stock_bulk", err))?;
            results.push(result);
        }

        let report = BulkValidationReport::from_results(results);
        info!(
            total = report.total,
            invalid = report.invalid_count,
            "Bulk stock validation finished"
        );
        Ok(report)
    }

    /// Current stock of a product.
    pub async fn available_stock(&self, product_id: &str) -> EngineResult<i64> {
        ProductRepository::new(self.pool.clone())
            .get_by_id(product_id)
            .await?
            .map(|product| product.stock)
            .ok_or_else(|| EngineError::from(CoreError::ProductNotFound(product_id.to_string())))
    }

    /// ACTIVE products at or below the critical threshold, lowest first.
    pub async fn critical_stock_products(&self) -> EngineResult<Vec<Product>> {
        let threshold = self.config.stock_policy.critical_threshold;
        Ok(ProductRepository::new(self.pool.clone())
            .list_critical(threshold)
            .await?)
    }

    async fn check_one(
        &self,
        conn: &mut SqliteConnection,
        check: &StockCheck,
    ) -> EngineResult<StockValidation> {
        let policy = &self.config.stock_policy;

        let product = match fetch_product(conn, &check.product_id).await? {
            Some(product) => product,
            None => {
                let err = CoreError::ProductNotFound(check.product_id.clone());
                return Ok(StockValidation::rejected(
                    &check.product_id,
                    check.quantity,
                    &err,
                    0,
                    0,
                    policy,
                ));
            }
        };

        let reject = |err: CoreError| {
            StockValidation::rejected(
                &product.id,
                check.quantity,
                &err,
                product.stock,
                product.stock,
                policy,
            )
        };

        if let Err(err) = validate_quantity(check.quantity) {
            return Ok(reject(err.into()));
        }

        let reservation = match &check.line_item_id {
            None => Reservation::New,
            Some(line_item_id) => match fetch_line_item(conn, line_item_id).await? {
                Some(item) if item.product_id == product.id => {
                    Reservation::Existing { held: item.quantity }
                }
                _ => return Ok(reject(CoreError::LineItemNotFound(line_item_id.clone()))),
            },
        };

        match StockValidation::classify(&product, check.quantity, &reservation, policy) {
            Ok(result) => Ok(result),
            Err(err) => Ok(reject(err)),
        }
    }
}
