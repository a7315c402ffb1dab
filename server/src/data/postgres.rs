//! PostgreSQL lookup store
//!
//! For deployments where the metadata and rule tables are shared across
//! multiple relay instances. Same schema as the SQLite backend; `labels`
//! stays a JSON text column so rules round-trip identically on both.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::core::constants::{POSTGRES_ACQUIRE_TIMEOUT_SECS, POSTGRES_MAX_CONNECTIONS};
use crate::data::error::DataError;
use crate::data::traits::{MetadataStore, ViewRuleStore};
use crate::data::types::{PodMetadata, ViewRule};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pod_metadata (
        pod     TEXT PRIMARY KEY,
        service TEXT NOT NULL,
        team    TEXT NOT NULL,
        tier    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS view_rules (
        id     BIGSERIAL PRIMARY KEY,
        view   TEXT NOT NULL UNIQUE,
        labels TEXT NOT NULL DEFAULT '[]'
    )",
];

/// PostgreSQL-backed implementation of both lookup traits
pub struct PostgresLookup {
    pool: PgPool,
}

impl PostgresLookup {
    /// Connect to the given URL and ensure the schema exists.
    pub async fn init(url: &str) -> Result<Self, DataError> {
        let pool = PgPoolOptions::new()
            .max_connections(POSTGRES_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(POSTGRES_ACQUIRE_TIMEOUT_SECS))
            .connect(url)
            .await
            .map_err(DataError::from_postgres)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(DataError::from_postgres)?;
        }

        tracing::debug!("PostgresLookup initialized");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }
}

#[async_trait]
impl MetadataStore for PostgresLookup {
    async fn metadata_for_pods(&self, pods: &[String]) -> Result<Vec<PodMetadata>, DataError> {
        if pods.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT pod, service, team, tier FROM pod_metadata WHERE pod = ANY($1)",
        )
        .bind(pods.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(DataError::from_postgres)?;

        Ok(rows
            .into_iter()
            .map(|(pod, service, team, tier)| PodMetadata {
                pod,
                service,
                team,
                tier,
            })
            .collect())
    }
}

#[async_trait]
impl ViewRuleStore for PostgresLookup {
    async fn list_rules(&self) -> Result<Vec<ViewRule>, DataError> {
        let rows =
            sqlx::query_as::<_, (String, String)>("SELECT view, labels FROM view_rules ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(DataError::from_postgres)?;

        rows.into_iter()
            .map(|(view, labels)| {
                let labels: Vec<String> = serde_json::from_str(&labels)?;
                Ok(ViewRule { view, labels })
            })
            .collect()
    }
}
