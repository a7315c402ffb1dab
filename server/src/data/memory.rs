//! In-memory lookup store
//!
//! Backs both store traits with plain maps behind a lock. Used by the stage
//! and pipeline tests, and handy for local smoke runs where no database is
//! wanted. Call counters exist so tests can assert how many queries a stage
//! actually issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::data::error::DataError;
use crate::data::traits::{MetadataStore, ViewRuleStore};
use crate::data::types::{PodMetadata, ViewRule};

#[derive(Default)]
pub struct MemoryLookup {
    metadata: RwLock<HashMap<String, PodMetadata>>,
    rules: RwLock<Vec<ViewRule>>,
    metadata_calls: AtomicUsize,
    rule_calls: AtomicUsize,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_metadata(&self, record: PodMetadata) {
        self.metadata.write().insert(record.pod.clone(), record);
    }

    pub fn insert_rule(&self, rule: ViewRule) {
        self.rules.write().push(rule);
    }

    /// Number of `metadata_for_pods` calls served so far
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    /// Number of `list_rules` calls served so far
    pub fn rule_calls(&self) -> usize {
        self.rule_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MetadataStore for MemoryLookup {
    async fn metadata_for_pods(&self, pods: &[String]) -> Result<Vec<PodMetadata>, DataError> {
        self.metadata_calls.fetch_add(1, Ordering::Relaxed);
        let metadata = self.metadata.read();
        Ok(pods
            .iter()
            .filter_map(|pod| metadata.get(pod).cloned())
            .collect())
    }
}

#[async_trait]
impl ViewRuleStore for MemoryLookup {
    async fn list_rules(&self) -> Result<Vec<ViewRule>, DataError> {
        self.rule_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.rules.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_lookup_filters_by_pod() {
        let store = MemoryLookup::new();
        store.insert_metadata(PodMetadata {
            pod: "p1".to_string(),
            service: "checkout".to_string(),
            team: "ecommerce".to_string(),
            tier: "critical".to_string(),
        });

        let records = store
            .metadata_for_pods(&["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pod, "p1");
        assert_eq!(store.metadata_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_rules_returns_insertion_order() {
        let store = MemoryLookup::new();
        store.insert_rule(ViewRule {
            view: "a".to_string(),
            labels: vec![],
        });
        store.insert_rule(ViewRule {
            view: "b".to_string(),
            labels: vec![],
        });

        let rules = store.list_rules().await.unwrap();
        assert_eq!(rules[0].view, "a");
        assert_eq!(rules[1].view, "b");
        assert_eq!(store.rule_calls(), 1);
    }
}
