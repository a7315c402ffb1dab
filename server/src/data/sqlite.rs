//! SQLite lookup store
//!
//! Embedded default backend. One small database file holds the pod metadata
//! and view rule tables; WAL mode keeps reads cheap while an operator
//! process updates the tables underneath the relay.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};

use crate::core::constants::{
    SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CACHE_SIZE, SQLITE_DB_FILENAME, SQLITE_MAX_CONNECTIONS,
};
use crate::data::error::DataError;
use crate::data::traits::{MetadataStore, ViewRuleStore};
use crate::data::types::{PodMetadata, ViewRule};

/// Lookup schema. `view_rules.labels` holds a JSON string array, mirroring
/// the document shape the rules are authored in.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pod_metadata (
        pod     TEXT PRIMARY KEY,
        service TEXT NOT NULL,
        team    TEXT NOT NULL,
        tier    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS view_rules (
        view   TEXT PRIMARY KEY,
        labels TEXT NOT NULL DEFAULT '[]'
    )",
];

/// SQLite-backed implementation of both lookup traits
pub struct SqliteLookup {
    pool: SqlitePool,
}

impl SqliteLookup {
    /// Open (or create) the database under `data_dir` and ensure the schema
    /// exists.
    pub async fn init(data_dir: &Path) -> Result<Self, DataError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(SQLITE_DB_FILENAME);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("cache_size", SQLITE_CACHE_SIZE)
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(DataError::from_sqlite)?;

        Self::ensure_schema(&pool).await?;

        tracing::debug!(path = %db_path.display(), "SqliteLookup initialized");
        Ok(Self { pool })
    }

    /// Create a SqliteLookup from an existing pool (primarily for testing)
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DataError> {
        Self::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn ensure_schema(pool: &SqlitePool) -> Result<(), DataError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(DataError::from_sqlite)?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}

#[async_trait]
impl MetadataStore for SqliteLookup {
    async fn metadata_for_pods(&self, pods: &[String]) -> Result<Vec<PodMetadata>, DataError> {
        if pods.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; pods.len()].join(", ");
        let sql = format!(
            "SELECT pod, service, team, tier FROM pod_metadata WHERE pod IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, (String, String, String, String)>(&sql);
        for pod in pods {
            query = query.bind(pod);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DataError::from_sqlite)?;

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
impl ViewRuleStore for SqliteLookup {
    async fn list_rules(&self) -> Result<Vec<ViewRule>, DataError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT view, labels FROM view_rules ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DataError::from_sqlite)?;

        rows.into_iter()
            .map(|(view, labels)| {
                let labels: Vec<String> = serde_json::from_str(&labels)?;
                Ok(ViewRule { view, labels })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_lookup() -> SqliteLookup {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        SqliteLookup::from_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_metadata_for_pods_filters() {
        let store = memory_lookup().await;
        for (pod, service) in [("p1", "checkout"), ("p2", "cart")] {
            sqlx::query("INSERT INTO pod_metadata (pod, service, team, tier) VALUES (?, ?, ?, ?)")
                .bind(pod)
                .bind(service)
                .bind("ecommerce")
                .bind("critical")
                .execute(store.pool())
                .await
                .unwrap();
        }

        let records = store
            .metadata_for_pods(&["p2".to_string(), "p9".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service, "cart");
    }

    #[tokio::test]
    async fn test_metadata_for_pods_empty_input() {
        let store = memory_lookup().await;
        assert!(store.metadata_for_pods(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_rules_parses_labels_json() {
        let store = memory_lookup().await;
        sqlx::query("INSERT INTO view_rules (view, labels) VALUES (?, ?)")
            .bind("operational")
            .bind(r#"["service","endpoint","error_type"]"#)
            .execute(store.pool())
            .await
            .unwrap();

        let rules = store.list_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].view, "operational");
        assert!(rules[0].retains("endpoint"));
    }

    #[tokio::test]
    async fn test_list_rules_rejects_bad_labels_json() {
        let store = memory_lookup().await;
        sqlx::query("INSERT INTO view_rules (view, labels) VALUES (?, ?)")
            .bind("broken")
            .bind("not json")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(matches!(
            store.list_rules().await,
            Err(DataError::Serialization(_))
        ));
    }
}
