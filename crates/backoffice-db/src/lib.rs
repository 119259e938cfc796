//! # backoffice-db: Storage and Transactional Engine
//!
//! SQLite persistence for products, orders and line items, and the services
//! that run every engine operation as one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order–Inventory Data Flow                           │
//! │                                                                         │
//! │  Caller (admin API, seed binary, tests)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   backoffice-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐    │   │
//! │  │   │   Services   │──►│    Ledger    │──►│   Repositories   │    │   │
//! │  │   │ catalog      │   │ decrement    │   │ product, order   │    │   │
//! │  │   │ inventory    │   │ increment    │   │                  │    │   │
//! │  │   │ line_items   │   └──────────────┘   └──────────────────┘    │   │
//! │  │   │ orders       │                                              │   │
//! │  │   └──────┬───────┘                                              │   │
//! │  │          │ rules                                                │   │
//! │  │          ▼                                                      │   │
//! │  │   backoffice-core (Order aggregate, stock engine, totals)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`config`] - Tax rate and stock policy from the environment
//! - [`service`] - Transactional engine operations
//! - [`ledger`] - The only code that moves stock
//! - [`repository`] - Row mapping for products, orders, line items
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - `DbError` and the `EngineError` callers see
//! - [`telemetry`] - tracing subscriber setup for binaries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backoffice_db::{Database, DbConfig, EngineConfig};
//!
//! let db = Database::new(DbConfig::new("orders.db"))
//!     .await?
//!     .with_engine(EngineConfig::from_env()?);
//!
//! let order = db.orders().create_order(new_order).await?;
//! db.line_items().add_line_item(&order.id, &product_id, 2).await?;
//! db.orders().apply_discount_percentage(&order.id, 10.0).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use error::{DbError, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use service::{CatalogService, InventoryService, LineItemService, OrderService};
