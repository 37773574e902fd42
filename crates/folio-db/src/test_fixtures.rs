//! Test fixtures for database integration tests.
//!
//! Every [`TestDatabase`] is a fresh, migrated SQLite file inside its own
//! temporary directory, removed when the fixture is dropped.
//!
//! ```rust,ignore
//! use folio_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let readout = test_db.db.documents.read_document(1).await.unwrap();
//! }
//! ```

use tempfile::TempDir;

use crate::{Database, PoolConfig};

/// Migrated scratch database with automatic cleanup.
pub struct TestDatabase {
    pub db: Database,
    pub url: String,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create and migrate a scratch database.
    ///
    /// Panics on setup failure; fixtures are only used from tests.
    pub async fn new() -> Self {
        Self::with_config(PoolConfig::default()).await
    }

    /// Create and migrate a scratch database with a custom pool configuration.
    pub async fn with_config(config: PoolConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir for test database");
        let url = format!("sqlite://{}", dir.path().join("folio_test.sqlite").display());

        let db = Database::connect_with_config(&url, config)
            .await
            .expect("Failed to connect to test database");
        db.migrate().await.expect("Failed to migrate test database");

        Self { db, url, _dir: dir }
    }

    /// Row count of an arbitrary table.
    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.db.pool)
            .await
            .expect("Failed to count rows")
    }
}
