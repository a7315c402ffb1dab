//! Lookup store traits
//!
//! The relay stages depend only on these narrow interfaces, injected at
//! construction. Each backend (SQLite, PostgreSQL, in-memory) implements
//! them with its own query logic.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{PodMetadata, ViewRule};

/// Keyed metadata lookup used by the enrichment stage.
///
/// One call per batch: the stage collects the deduplicated pod set and asks
/// for all matching records at once.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the records whose pod key is in `pods`. Pods without a record
    /// are simply absent from the result; multiplicity is store-owned.
    async fn metadata_for_pods(&self, pods: &[String]) -> Result<Vec<PodMetadata>, DataError>;
}

/// Duplication ruleset lookup used by the view duplication stage.
#[async_trait]
pub trait ViewRuleStore: Send + Sync {
    /// Fetch the complete current ruleset. No filtering parameters; the
    /// store owns which rules are current.
    async fn list_rules(&self) -> Result<Vec<ViewRule>, DataError>;
}
