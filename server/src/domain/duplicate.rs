//! View duplication stage
//!
//! Expands series of one configured trigger metric into per-view copies,
//! each keeping only the labels its rule names plus a forced `view` label.
//! The current ruleset is fetched fresh on every invocation; rules change
//! underneath the relay without a restart.

use std::sync::{Arc, Once};

use crate::core::constants::{LABEL_METRIC_NAME, LABEL_VIEW};
use crate::data::traits::ViewRuleStore;
use crate::domain::error::StageError;
use crate::domain::symbols::{LabelMap, SymbolTable, decode_labels, encode_labels, label_value};
use crate::wire::WriteRequest;

static EMPTY_RULESET_WARN: Once = Once::new();

pub struct ViewDuplication {
    store: Arc<dyn ViewRuleStore>,
    trigger: String,
}

impl ViewDuplication {
    pub fn new(store: Arc<dyn ViewRuleStore>, trigger: impl Into<String>) -> Self {
        Self {
            store,
            trigger: trigger.into(),
        }
    }

    /// Transform one batch. Non-trigger series pass through 1:1 in input
    /// order; each trigger series is replaced by one derived series per
    /// rule, in rule order, at its original position.
    ///
    /// With an empty ruleset a trigger series produces no output at all.
    /// That drop is intentional behavior of the stage as deployed; it is
    /// logged once per process so operators can see it happening.
    pub async fn apply(&self, mut batch: WriteRequest) -> Result<WriteRequest, StageError> {
        let rules = self.store.list_rules().await?;
        let mut table = SymbolTable::new(std::mem::take(&mut batch.symbols));

        let mut expanded = Vec::with_capacity(batch.timeseries.len());
        for series in batch.timeseries {
            let is_trigger = label_value(&series.labels_refs, &table, LABEL_METRIC_NAME)?
                .is_some_and(|name| name == self.trigger);
            if !is_trigger {
                expanded.push(series);
                continue;
            }

            if rules.is_empty() {
                EMPTY_RULESET_WARN.call_once(|| {
                    tracing::warn!(
                        metric = %self.trigger,
                        "empty view ruleset: trigger series are being dropped"
                    );
                });
                continue;
            }

            let source = decode_labels(&series.labels_refs, &table)?;
            for rule in &rules {
                let mut labels = LabelMap::new();
                if let Some(name) = source.get(LABEL_METRIC_NAME) {
                    labels.insert(LABEL_METRIC_NAME.to_string(), name.clone());
                }
                for (name, value) in &source {
                    if rule.retains(name) {
                        labels.insert(name.clone(), value.clone());
                    }
                }
                // Inserted last: wins over any retained source label
                // literally named "view".
                labels.insert(LABEL_VIEW.to_string(), rule.view.clone());

                let mut derived = series.clone();
                derived.labels_refs = encode_labels(&labels, &mut table);
                expanded.push(derived);
            }
        }

        tracing::debug!(
            rules = rules.len(),
            series_out = expanded.len(),
            "view duplication applied"
        );

        batch.timeseries = expanded;
        batch.symbols = table.into_inner();
        Ok(batch)
    }
}
