//! SQLite lead store.
//!
//! This crate persists sales leads, rejects duplicates by email or phone,
//! imports CSV batches and computes dashboard statistics, using SQLx with
//! SQLite.
//!
//! # Example
//!
//! ```no_run
//! use lead_store::{lead, stats, Database, NewLead};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:leads.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Add a lead from the entry form
//!     let candidate = NewLead::new(Some("Ada"), "ada@example.com", "(555) 123-4567");
//!     lead::create_lead(db.pool(), &candidate).await?;
//!
//!     let kpis = stats::load(db.pool(), stats::DEFAULT_WINDOW).await?;
//!     println!("{} leads, {}% converted", kpis.total, kpis.conversion_rate);
//!
//!     Ok(())
//! }
//! ```

pub mod duplicate;
pub mod error;
pub mod import;
pub mod lead;
pub mod models;
pub mod stats;
pub mod validation;

pub use duplicate::{BatchDuplicatePolicy, DuplicateReason, ExistingKeys};
pub use error::{DatabaseError, Result};
pub use import::{ImportColumns, ImportError, ImportOptions, ImportReport};
pub use models::{Lead, LeadEdit, LeadStatus, NewLead};
pub use stats::LeadStats;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
///
/// Handed explicitly to every operation; each instance is an isolated store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/leads.db?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> lead_store::Result<()> {
    /// // File database
    /// let db = lead_store::Database::connect("sqlite:data/leads.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = lead_store::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
