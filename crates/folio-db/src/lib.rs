//! # folio-db
//!
//! SQLite persistence layer for folio.
//!
//! This crate provides:
//! - Connection pool management
//! - Embedded schema migrations
//! - The document/page/page-image repository, with transaction-aware writes
//!   for the onboarding pipeline and a read path for onboarded documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite://db.sqlite").await?;
//!     db.migrate().await?;
//!
//!     let readout = db.documents.read_document(1).await?;
//!     println!("{:?}", readout);
//!     Ok(())
//! }
//! ```
pub mod documents;
pub mod pool;

// Test fixtures for integration tests in this and downstream crates
pub mod test_fixtures;

use sqlx::migrate::Migrator;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

pub use folio_core::*;

pub use documents::SqliteDocumentRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Combined database context.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Document, page and page-image repository.
    pub documents: SqliteDocumentRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            documents: SqliteDocumentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        run_migrations(&self.pool).await
    }

    /// Begin a write transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(Error::Database)
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Apply the embedded migrations to a pool.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| Error::Migration(e.to_string()))?;

    info!(
        subsystem = "db",
        component = "migrate",
        migrations = MIGRATOR.iter().count(),
        "Schema migrations applied"
    );
    Ok(())
}
