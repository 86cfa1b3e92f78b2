//! # searchive-db
//!
//! PostgreSQL database layer and blob storage for searchive.
//!
//! This crate provides:
//! - Connection pool management
//! - Document metadata and tag catalog repositories
//! - Blob store backends (filesystem, S3-compatible)
//! - Schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use searchive_db::{Database, PoolConfig};
//! use searchive_core::TagCatalog;
//!
//! let db = Database::connect_with_config("postgres://localhost/searchive", PoolConfig::from_env()).await?;
//! let tags = db.tags.attach_tags_to_document(42, &["rust".into()]).await?;
//! ```

pub mod documents;
pub mod pool;
pub mod storage;
pub mod tags;
pub mod test_fixtures;

pub use documents::PgDocumentRepository;
pub use pool::{create_pool_with_config, log_pool_metrics, spawn_pool_metrics, PoolConfig};
pub use storage::FilesystemBlobStore;
#[cfg(feature = "s3")]
pub use storage::{S3BlobStore, S3Config};
pub use tags::PgTagRepository;

#[cfg(feature = "migrations")]
use searchive_core::Error;
use searchive_core::Result;

/// Database handle bundling the pool and every repository.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Document metadata repository.
    pub documents: PgDocumentRepository,
    /// Tag catalog.
    pub tags: PgTagRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: PgDocumentRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with a custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
