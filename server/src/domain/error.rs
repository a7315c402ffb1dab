//! Stage-level error type
//!
//! Any of these fails the whole batch invocation: no partially transformed
//! batch is ever forwarded.

use std::time::Duration;

use thiserror::Error;

use crate::data::DataError;

#[derive(Error, Debug)]
pub enum StageError {
    /// External lookup query failed (store or transport fault)
    #[error("lookup failed: {0}")]
    Lookup(#[from] DataError),

    /// The host-imposed stage deadline elapsed
    #[error("stage timed out after {0:?}")]
    Timeout(Duration),

    /// A series carried an odd number of label refs; labels come in
    /// (name, value) pairs, so this indicates upstream corruption
    #[error("series has an odd number of label refs ({refs})")]
    MalformedLabels { refs: usize },

    /// A label ref pointed past the end of the batch's symbol table
    #[error("label ref {index} out of range for symbol table of {len} entries")]
    SymbolOutOfRange { index: u32, len: usize },
}
