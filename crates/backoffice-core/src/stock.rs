//! # Stock Validation Engine
//!
//! Classifies a requested reservation against a product's stock. Never
//! mutates anything: the ledger in backoffice-db does the actual decrement.
//!
//! ## Headroom
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Creation mode   (no line item yet)                                     │
//! │     headroom = stock                                                    │
//! │                                                                         │
//! │  Update mode     (line item L already holds `held` units)               │
//! │     headroom = stock + held      ← L's own units count as available     │
//! │                                                                         │
//! │  Example: stock 5, L holds 3  →  headroom 8                             │
//! │           new qty 8 → ok (ledger takes the remaining 5)                 │
//! │           new qty 9 → InsufficientStock { available: 8, requested: 9 }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check Order
//! | step | creation                         | update                              |
//! |------|----------------------------------|-------------------------------------|
//! | 1    | status ≠ ACTIVE → Unavailable    | growing and status ≠ ACTIVE → Unavailable |
//! | 2    | headroom < min → Insufficient    | headroom < min → Insufficient       |
//! | 3    | headroom == critical and asking more → Critical | headroom == held and asking more → Critical |
//! | 4    | requested > headroom → Insufficient | same                             |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::{CRITICAL_HEADROOM, CRITICAL_STOCK_THRESHOLD, MIN_STOCK_FOR_CREATION, MIN_STOCK_FOR_UPDATE};

// =============================================================================
// Policy
// =============================================================================

/// Tunable thresholds for the validation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockPolicy {
    /// Stock at or below this is reported as critical.
    pub critical_threshold: i64,
    /// Minimum headroom for adding a new line item.
    pub min_stock_for_creation: i64,
    /// Minimum headroom for editing an existing line item.
    pub min_stock_for_update: i64,
    /// Headroom at which asking for more than is left raises `StockCritical`.
    pub critical_headroom: i64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        StockPolicy {
            critical_threshold: CRITICAL_STOCK_THRESHOLD,
            min_stock_for_creation: MIN_STOCK_FOR_CREATION,
            min_stock_for_update: MIN_STOCK_FOR_UPDATE,
            critical_headroom: CRITICAL_HEADROOM,
        }
    }
}

impl StockPolicy {
    pub fn is_critical(&self, stock: i64) -> bool {
        stock <= self.critical_threshold
    }
}

// =============================================================================
// Reservation context
// =============================================================================

/// Whether the request creates a reservation or edits one.
///
/// `held` is the quantity the edited line item already reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    New,
    Existing { held: i64 },
}

impl Reservation {
    /// Units the line item already holds (0 for a new line).
    pub fn held(&self) -> i64 {
        match self {
            Reservation::New => 0,
            Reservation::Existing { held } => *held,
        }
    }

    /// Stock plus whatever this line already holds.
    pub fn headroom(&self, product: &Product) -> i64 {
        product.stock + self.held()
    }
}

/// Checks `requested` units of `product` against its headroom.
///
/// Returns the headroom on success.
pub fn check_reservation(
    product: &Product,
    requested: i64,
    reservation: &Reservation,
    policy: &StockPolicy,
) -> CoreResult<i64> {
    let headroom = reservation.headroom(product);

    match reservation {
        Reservation::New => {
            ensure_active(product)?;
            if headroom < policy.min_stock_for_creation {
                return Err(insufficient(product, headroom, policy.min_stock_for_creation));
            }
            if headroom == policy.critical_headroom && requested > headroom {
                return Err(CoreError::StockCritical {
                    product_name: product.name.clone(),
                    available: headroom,
                    reserved: None,
                });
            }
        }
        Reservation::Existing { held } => {
            let held = *held;
            if requested > held {
                ensure_active(product)?;
            }
            if headroom < policy.min_stock_for_update {
                return Err(insufficient(product, headroom, policy.min_stock_for_update));
            }
            if headroom == held && requested > held {
                return Err(CoreError::StockCritical {
                    product_name: product.name.clone(),
                    available: headroom,
                    reserved: Some(held),
                });
            }
        }
    }

    if requested > headroom {
        return Err(insufficient(product, headroom, requested));
    }

    Ok(headroom)
}

fn ensure_active(product: &Product) -> CoreResult<()> {
    if product.is_active() {
        Ok(())
    } else {
        Err(CoreError::ProductUnavailable {
            product_name: product.name.clone(),
            status: product.status.to_string(),
        })
    }
}

fn insufficient(product: &Product, available: i64, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        product_name: product.name.clone(),
        available,
        requested,
    }
}

// =============================================================================
// Structured results
// =============================================================================

/// One entry of a stock check request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockCheck {
    pub product_id: String,
    pub quantity: i64,
    /// Set when checking an edit of an existing line item.
    pub line_item_id: Option<String>,
}

impl StockCheck {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        StockCheck {
            product_id: product_id.into(),
            quantity,
            line_item_id: None,
        }
    }

    pub fn for_line_item(mut self, line_item_id: impl Into<String>) -> Self {
        self.line_item_id = Some(line_item_id.into());
        self
    }
}

/// Outcome of checking one (product, quantity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValidation {
    pub product_id: String,
    pub requested: i64,
    pub valid: bool,
    pub message: String,
    /// Product stock as read.
    pub current_stock: i64,
    /// Headroom used for the decision.
    pub available_stock: i64,
    /// Stock at or below the critical threshold.
    pub critical: bool,
    pub recommended_action: String,
}

impl StockValidation {
    /// Runs the engine and turns its verdict into a result.
    ///
    /// Only stock rejections become invalid results; every other error is
    /// returned to the caller.
    pub fn classify(
        product: &Product,
        requested: i64,
        reservation: &Reservation,
        policy: &StockPolicy,
    ) -> CoreResult<Self> {
        match check_reservation(product, requested, reservation, policy) {
            Ok(headroom) => Ok(Self::accepted(product, requested, headroom, policy)),
            Err(err) if err.is_stock_rejection() => Ok(Self::rejected(
                &product.id,
                requested,
                &err,
                product.stock,
                reservation.headroom(product),
                policy,
            )),
            Err(err) => Err(err),
        }
    }

    fn accepted(product: &Product, requested: i64, headroom: i64, policy: &StockPolicy) -> Self {
        let critical = policy.is_critical(product.stock);
        StockValidation {
            product_id: product.id.clone(),
            requested,
            valid: true,
            message: if critical {
                format!("Stock available for {} (critical level)", product.name)
            } else {
                format!("Stock available for {}", product.name)
            },
            current_stock: product.stock,
            available_stock: headroom,
            critical,
            recommended_action: if critical { "Buy soon" } else { "Available" }.to_string(),
        }
    }

    /// Builds an invalid result from a business error.
    pub fn rejected(
        product_id: &str,
        requested: i64,
        err: &CoreError,
        current_stock: i64,
        available_stock: i64,
        policy: &StockPolicy,
    ) -> Self {
        let action = match err {
            CoreError::InsufficientStock { .. } | CoreError::StockCritical { .. } => {
                "Reduce quantity or choose another product"
            }
            _ => "Choose another product",
        };
        StockValidation {
            product_id: product_id.to_string(),
            requested,
            valid: false,
            message: err.to_string(),
            current_stock,
            available_stock,
            critical: policy.is_critical(current_stock),
            recommended_action: action.to_string(),
        }
    }
}

/// Aggregate of a batch of stock checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkValidationReport {
    pub all_valid: bool,
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Products with at least one invalid check, first-seen order, no repeats.
    pub invalid_product_ids: Vec<String>,
    pub summary: String,
    /// One entry per request, in request order.
    pub results: Vec<StockValidation>,
}

impl BulkValidationReport {
    pub fn from_results(results: Vec<StockValidation>) -> Self {
        let total = results.len();
        let valid_count = results.iter().filter(|r| r.valid).count();
        let invalid_count = total - valid_count;

        let mut invalid_product_ids: Vec<String> = Vec::new();
        for result in results.iter().filter(|r| !r.valid) {
            if !invalid_product_ids.contains(&result.product_id) {
                invalid_product_ids.push(result.product_id.clone());
            }
        }

        let summary = if invalid_count == 0 {
            format!("All {total} items have sufficient stock")
        } else {
            format!("{invalid_count} of {total} items cannot be fulfilled")
        };

        BulkValidationReport {
            all_valid: invalid_count == 0,
            total,
            valid_count,
            invalid_count,
            invalid_product_ids,
            summary,
            results,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductStatus;
    use chrono::Utc;

    fn product(stock: i64, status: ProductStatus) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "MOU-001".to_string(),
            name: "Mouse".to_string(),
            description: None,
            price_cents: 1500,
            stock,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn existing(held: i64) -> Reservation {
        Reservation::Existing { held }
    }

    fn policy() -> StockPolicy {
        StockPolicy::default()
    }

    #[test]
    fn test_reservation_headroom() {
        let p = product(5, ProductStatus::Active);
        assert_eq!(Reservation::New.held(), 0);
        assert_eq!(Reservation::New.headroom(&p), 5);
        assert_eq!(existing(3).held(), 3);
        assert_eq!(existing(3).headroom(&p), 8);
    }

    #[test]
    fn test_creation_within_stock() {
        let p = product(10, ProductStatus::Active);
        assert_eq!(check_reservation(&p, 4, &Reservation::New, &policy()), Ok(10));
    }

    #[test]
    fn test_creation_inactive_product() {
        let p = product(10, ProductStatus::Discontinued);
        let err = check_reservation(&p, 1, &Reservation::New, &policy()).unwrap_err();
        assert!(matches!(err, CoreError::ProductUnavailable { ref status, .. } if status == "DISCONTINUED"));
    }

    #[test]
    fn test_creation_with_no_stock_reports_minimum() {
        let p = product(0, ProductStatus::Active);
        let err = check_reservation(&p, 5, &Reservation::New, &policy()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_name: "Mouse".to_string(),
                available: 0,
                requested: 1,
            }
        );
    }

    #[test]
    fn test_creation_single_unit_left() {
        let p = product(1, ProductStatus::Active);
        assert!(matches!(
            check_reservation(&p, 2, &Reservation::New, &policy()),
            Err(CoreError::StockCritical { available: 1, reserved: None, .. })
        ));
        assert_eq!(check_reservation(&p, 1, &Reservation::New, &policy()), Ok(1));
    }

    #[test]
    fn test_creation_exceeding_headroom() {
        let p = product(3, ProductStatus::Active);
        assert!(matches!(
            check_reservation(&p, 4, &Reservation::New, &policy()),
            Err(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));
    }

    #[test]
    fn test_update_counts_own_reservation() {
        let p = product(5, ProductStatus::Active);
        assert_eq!(check_reservation(&p, 8, &existing(3), &policy()), Ok(8));
        assert!(matches!(
            check_reservation(&p, 9, &existing(3), &policy()),
            Err(CoreError::InsufficientStock { available: 8, requested: 9, .. })
        ));
    }

    #[test]
    fn test_update_without_slack_is_critical() {
        let p = product(0, ProductStatus::Active);
        assert!(matches!(
            check_reservation(&p, 3, &existing(2), &policy()),
            Err(CoreError::StockCritical { available: 2, reserved: Some(2), .. })
        ));
        // Keeping or shrinking needs no slack
        assert!(check_reservation(&p, 2, &existing(2), &policy()).is_ok());
        assert!(check_reservation(&p, 1, &existing(2), &policy()).is_ok());
    }

    #[test]
    fn test_update_shrinking_on_inactive_product_is_allowed() {
        let p = product(4, ProductStatus::Inactive);
        assert!(check_reservation(&p, 1, &existing(3), &policy()).is_ok());
        assert!(matches!(
            check_reservation(&p, 5, &existing(3), &policy()),
            Err(CoreError::ProductUnavailable { .. })
        ));
    }

    #[test]
    fn test_configured_policy() {
        let strict = StockPolicy {
            min_stock_for_creation: 5,
            critical_headroom: 5,
            ..StockPolicy::default()
        };
        let p = product(4, ProductStatus::Active);
        assert!(matches!(
            check_reservation(&p, 1, &Reservation::New, &strict),
            Err(CoreError::InsufficientStock { requested: 5, .. })
        ));

        let p = product(5, ProductStatus::Active);
        assert!(matches!(
            check_reservation(&p, 6, &Reservation::New, &strict),
            Err(CoreError::StockCritical { available: 5, .. })
        ));
    }

    #[test]
    fn test_classify_valid_and_critical() {
        let p = product(3, ProductStatus::Active);
        let result = StockValidation::classify(&p, 2, &Reservation::New, &policy()).unwrap();
        assert!(result.valid);
        assert!(result.critical);
        assert_eq!(result.recommended_action, "Buy soon");

        let p = product(50, ProductStatus::Active);
        let result = StockValidation::classify(&p, 2, &Reservation::New, &policy()).unwrap();
        assert!(!result.critical);
        assert_eq!(result.recommended_action, "Available");
    }

    #[test]
    fn test_classify_rejections() {
        let p = product(2, ProductStatus::Active);
        let result = StockValidation::classify(&p, 5, &Reservation::New, &policy()).unwrap();
        assert!(!result.valid);
        assert_eq!(
            result.message,
            "Insufficient stock for Mouse: available 2, requested 5"
        );
        assert_eq!(
            result.recommended_action,
            "Reduce quantity or choose another product"
        );

        let p = product(9, ProductStatus::Inactive);
        let result = StockValidation::classify(&p, 1, &Reservation::New, &policy()).unwrap();
        assert!(!result.valid);
        assert_eq!(result.recommended_action, "Choose another product");
    }

    #[test]
    fn test_bulk_report_aggregation() {
        let ok = product(10, ProductStatus::Active);
        let mut low = product(1, ProductStatus::Active);
        low.id = "p-2".to_string();

        let results = vec![
            StockValidation::classify(&low, 2, &Reservation::New, &policy()).unwrap(),
            StockValidation::classify(&ok, 1, &Reservation::New, &policy()).unwrap(),
            StockValidation::classify(&low, 3, &Reservation::New, &policy()).unwrap(),
        ];
        let report = BulkValidationReport::from_results(results);

        assert!(!report.all_valid);
        assert_eq!(report.total, 3);
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.invalid_count, 2);
        assert_eq!(report.invalid_product_ids, vec!["p-2".to_string()]);
        assert_eq!(report.results[1].product_id, "p-1");
        assert_eq!(report.summary, "2 of 3 items cannot be fulfilled");
    }

    #[test]
    fn test_empty_bulk_report_is_valid() {
        let report = BulkValidationReport::from_results(Vec::new());
        assert!(report.all_valid);
        assert_eq!(report.summary, "All 0 items have sufficient stock");
    }
}
