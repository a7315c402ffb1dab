//! Metadata enrichment stage
//!
//! Attaches pod ownership metadata (`service`, `team`, `tier`) to every
//! series carrying a `pod` label. One batched store query per invocation;
//! batches with no `pod` labels anywhere skip the store entirely.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::core::constants::{LABEL_POD, LABEL_SERVICE, LABEL_TEAM, LABEL_TIER};
use crate::data::traits::MetadataStore;
use crate::data::types::PodMetadata;
use crate::domain::error::StageError;
use crate::domain::symbols::{SymbolTable, decode_labels, encode_labels, label_value};
use crate::wire::WriteRequest;

pub struct MetadataEnrichment {
    store: Arc<dyn MetadataStore>,
}

impl MetadataEnrichment {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Transform one batch. Series count and order are preserved; only
    /// series whose pod has a metadata record are rewritten, the rest keep
    /// their refs untouched.
    pub async fn apply(&self, mut batch: WriteRequest) -> Result<WriteRequest, StageError> {
        let mut table = SymbolTable::new(std::mem::take(&mut batch.symbols));

        let mut pods: BTreeSet<String> = BTreeSet::new();
        for series in &batch.timeseries {
            if let Some(pod) = label_value(&series.labels_refs, &table, LABEL_POD)? {
                pods.insert(pod.to_string());
            }
        }

        if pods.is_empty() {
            batch.symbols = table.into_inner();
            return Ok(batch);
        }

        let pods: Vec<String> = pods.into_iter().collect();
        let records = self.store.metadata_for_pods(&pods).await?;

        // At most one record per pod; duplicates from the store collapse
        // last-wins.
        let by_pod: HashMap<String, PodMetadata> = records
            .into_iter()
            .map(|record| (record.pod.clone(), record))
            .collect();

        tracing::debug!(
            pods = pods.len(),
            records = by_pod.len(),
            series = batch.timeseries.len(),
            "enriching batch"
        );

        for series in &mut batch.timeseries {
            let pod = match label_value(&series.labels_refs, &table, LABEL_POD)? {
                Some(pod) => pod.to_string(),
                None => continue,
            };
            let Some(record) = by_pod.get(&pod) else {
                continue;
            };

            let mut labels = decode_labels(&series.labels_refs, &table)?;
            labels.insert(LABEL_SERVICE.to_string(), record.service.clone());
            labels.insert(LABEL_TEAM.to_string(), record.team.clone());
            labels.insert(LABEL_TIER.to_string(), record.tier.clone());
            series.labels_refs = encode_labels(&labels, &mut table);
        }

        batch.symbols = table.into_inner();
        Ok(batch)
    }
}
