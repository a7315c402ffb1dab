//! Lookup store layer
//!
//! Provides the external document stores the relay stages query:
//! - `sqlite` - embedded default backend
//! - `postgres` - shared backend for multi-instance deployments
//! - `memory` - in-memory backing for tests and smoke runs
//! - `types` - record types shared across backends
//! - `traits` - the narrow per-store interfaces the stages depend on
//! - `error` - unified error type for all backends

pub mod error;
pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use memory::MemoryLookup;
pub use postgres::PostgresLookup;
pub use sqlite::SqliteLookup;
pub use traits::{MetadataStore, ViewRuleStore};
pub use types::{PodMetadata, ViewRule};

use std::sync::Arc;

use crate::core::config::{DatabaseConfig, LookupBackend};

/// Lookup store service enum
///
/// Wraps the backend-specific store (SQLite or PostgreSQL) selected by
/// configuration and hands out the trait objects the stages are built with.
pub enum LookupService {
    /// SQLite backend (default, embedded)
    Sqlite(Arc<SqliteLookup>),
    /// PostgreSQL backend (for shared deployments)
    Postgres(Arc<PostgresLookup>),
}

impl LookupService {
    /// Initialize the lookup service based on configuration
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        match config.backend {
            LookupBackend::Sqlite => {
                let store = SqliteLookup::init(&config.data_dir).await?;
                Ok(Self::Sqlite(Arc::new(store)))
            }
            LookupBackend::Postgres => {
                let url = config.postgres_url.as_deref().ok_or_else(|| {
                    DataError::Config("PostgreSQL connection URL required".to_string())
                })?;
                let store = PostgresLookup::init(url).await?;
                Ok(Self::Postgres(Arc::new(store)))
            }
        }
    }

    /// Get the backend type
    pub fn backend(&self) -> LookupBackend {
        match self {
            Self::Sqlite(_) => LookupBackend::Sqlite,
            Self::Postgres(_) => LookupBackend::Postgres,
        }
    }

    /// Metadata store handle for the enrichment stage
    pub fn metadata_store(&self) -> Arc<dyn MetadataStore> {
        match self {
            Self::Sqlite(s) => Arc::clone(s) as Arc<dyn MetadataStore>,
            Self::Postgres(p) => Arc::clone(p) as Arc<dyn MetadataStore>,
        }
    }

    /// Rule store handle for the duplication stage
    pub fn rule_store(&self) -> Arc<dyn ViewRuleStore> {
        match self {
            Self::Sqlite(s) => Arc::clone(s) as Arc<dyn ViewRuleStore>,
            Self::Postgres(p) => Arc::clone(p) as Arc<dyn ViewRuleStore>,
        }
    }

    /// Close the underlying pool gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(s) => s.close().await,
            Self::Postgres(p) => p.close().await,
        }
    }
}
