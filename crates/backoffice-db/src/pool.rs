//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite, and the
//! [`Database`] handle that hands out repositories and engine services.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path)           ← pool settings                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await   ← pool + migrations                      │
//! │       │                                                                 │
//! │       ├── .with_engine(EngineConfig::from_env()?)                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │            SqlitePool                   │                            │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐        │                            │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...    │  (max_connections)         │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘        │                            │
//! │  └─────────────────────────────────────────┘                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.line_items().add_line_item(..)  ← one transaction per call          │
//! │  db.orders().mark_as_paid(..)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! Readers never block the single writer. Engine operations open their
//! transactions with `BEGIN IMMEDIATE`, so a second writer waits on the
//! database lock for up to `busy_timeout` and then runs against the latest
//! committed state. Only a wait longer than that fails, as a storage error.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::service::{CatalogService, InventoryService, LineItemService, OrderService};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/backoffice/orders.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a free pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits for the database lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// A single connection holds the whole database, so concurrent
    /// operations queue for it and run one transaction at a time.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle.
///
/// Cheap to clone; every clone shares the pool. Services are built on
/// demand and carry the engine configuration with them.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("orders.db"))
///     .await?
///     .with_engine(EngineConfig::from_env()?);
///
/// let order = db.orders().create_order(new_order).await?;
/// db.line_items().add_line_item(&order.id, &product_id, 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Tax rate and stock policy handed to every service.
    engine: EngineConfig,
}

impl Database {
    /// Creates the connection pool and, if enabled, runs migrations.
    ///
    /// ## SQLite settings
    /// - WAL journal
    /// - NORMAL synchronous
    /// - foreign keys on (line items cascade with their order)
    /// - busy timeout from the config
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates the file if it does not exist
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            engine: EngineConfig::default(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Replaces the engine configuration used by services built afterwards.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        info!(
            tax_rate_bps = engine.tax_rate.bps(),
            critical_threshold = engine.stock_policy.critical_threshold,
            "Engine configuration applied"
        );
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Repositories (plain reads)
    // -------------------------------------------------------------------------

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn order_records(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Engine services (one transaction per operation)
    // -------------------------------------------------------------------------

    /// Product lifecycle and restocking.
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.pool.clone(), self.engine)
    }

    /// Stock checks and the critical-stock report.
    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.pool.clone(), self.engine)
    }

    /// Adding, resizing and removing line items.
    pub fn line_items(&self) -> LineItemService {
        LineItemService::new(self.pool.clone(), self.engine)
    }

    /// Order lifecycle, discounts, notes and deletion.
    pub fn orders(&self) -> OrderService {
        OrderService::new(self.pool.clone(), self.engine)
    }

    /// Closes the pool. Every later operation fails with a storage error.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// True if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::{StockPolicy, TaxRate};

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert_eq!(db.engine(), &EngineConfig::default());
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/orders.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(config.run_migrations);
    }

    #[tokio::test]
    async fn test_engine_config_reaches_services() {
        let engine = EngineConfig::default()
            .with_tax_rate(TaxRate::zero())
            .with_stock_policy(StockPolicy {
                critical_threshold: 10,
                ..StockPolicy::default()
            });
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_engine(engine);

        let product = db
            .catalog()
            .create_product(backoffice_core::NewProduct {
                sku: "TAXFREE-1".to_string(),
                name: "Tax free".to_string(),
                description: None,
                price_cents: 1000,
                stock: 8,
                status: None,
            })
            .await
            .unwrap();
        assert!(db.catalog().is_stock_critical(&product));

        let order = db
            .orders()
            .create_order(backoffice_core::NewOrder {
                customer_id: "c-1".to_string(),
                salesperson_id: "s-1".to_string(),
                notes: None,
            })
            .await
            .unwrap();
        db.line_items()
            .add_line_item(&order.id, &product.id, 2)
            .await
            .unwrap();

        let order = db.orders().get_order(&order.id).await.unwrap();
        assert_eq!(order.tax_cents, 0);
        assert_eq!(order.total_cents, 2000);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_health_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
