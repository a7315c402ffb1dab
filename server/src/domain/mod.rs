//! Relay domain logic
//!
//! - `symbols` - symbol table and label codec
//! - `enrich` - pod metadata enrichment stage
//! - `duplicate` - view duplication stage
//! - `pipeline` - per-batch invocation host
//! - `forward` - outbound remote write sender

pub mod duplicate;
pub mod enrich;
pub mod error;
pub mod forward;
pub mod pipeline;
pub mod symbols;

pub use duplicate::ViewDuplication;
pub use enrich::MetadataEnrichment;
pub use error::StageError;
pub use forward::{BatchSink, ForwardError, Forwarder};
pub use pipeline::RelayPipeline;
pub use symbols::{LabelMap, SymbolTable, decode_labels, encode_labels, label_value};
