//! Symbol table and label codec
//!
//! A batch's labels are encoded as flat (name, value) index pairs into one
//! shared string table. The table is append-only and deduplicating: a
//! string's position is its stable reference for the lifetime of the batch,
//! so rewriting one series never invalidates another's refs (or the
//! payload-side `help_ref`/`unit_ref` fields).

use std::collections::BTreeMap;

use super::error::StageError;

/// Name → value view of a series' labels. BTreeMap iteration order doubles
/// as the canonical ascending-name encode order.
pub type LabelMap = BTreeMap<String, String>;

/// Append-only deduplicating string interner with dense indices from 0.
///
/// Interning is a linear scan. Per-batch label cardinality is small enough
/// that this beats hashing in practice; revisit if profiles ever say
/// otherwise.
#[derive(Debug, Default)]
pub struct SymbolTable(Vec<String>);

impl SymbolTable {
    pub fn new(symbols: Vec<String>) -> Self {
        Self(symbols)
    }

    /// Hand the table back to the batch it came from.
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the string at `index`. Out-of-range refs indicate a corrupt
    /// batch and fail the invocation.
    pub fn resolve(&self, index: u32) -> Result<&str, StageError> {
        self.0
            .get(index as usize)
            .map(String::as_str)
            .ok_or(StageError::SymbolOutOfRange {
                index,
                len: self.0.len(),
            })
    }

    /// Return the existing index for `symbol`, or append it and return the
    /// new one. Never reorders existing entries.
    pub fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(idx) = self.0.iter().position(|s| s == symbol) {
            return idx as u32;
        }
        self.0.push(symbol.to_string());
        (self.0.len() - 1) as u32
    }
}

/// Decode a series' label refs into a name → value mapping.
pub fn decode_labels(refs: &[u32], table: &SymbolTable) -> Result<LabelMap, StageError> {
    if refs.len() % 2 != 0 {
        return Err(StageError::MalformedLabels { refs: refs.len() });
    }
    let mut labels = LabelMap::new();
    for pair in refs.chunks_exact(2) {
        let name = table.resolve(pair[0])?;
        let value = table.resolve(pair[1])?;
        labels.insert(name.to_string(), value.to_string());
    }
    Ok(labels)
}

/// Scan a series' refs for one label by name, without building the full
/// mapping. Returns `None` when the label is absent.
pub fn label_value<'a>(
    refs: &[u32],
    table: &'a SymbolTable,
    name: &str,
) -> Result<Option<&'a str>, StageError> {
    if refs.len() % 2 != 0 {
        return Err(StageError::MalformedLabels { refs: refs.len() });
    }
    for pair in refs.chunks_exact(2) {
        if table.resolve(pair[0])? == name {
            return Ok(Some(table.resolve(pair[1])?));
        }
    }
    Ok(None)
}

/// Encode a label mapping back into flat refs, interning every name and
/// value. Pairs are emitted in ascending name order so re-encoded batches
/// are byte-stable.
pub fn encode_labels(labels: &LabelMap, table: &mut SymbolTable) -> Vec<u32> {
    let mut refs = Vec::with_capacity(labels.len() * 2);
    for (name, value) in labels {
        refs.push(table.intern(name));
        refs.push(table.intern(value));
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(symbols: &[&str]) -> SymbolTable {
        SymbolTable::new(symbols.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut t = table(&["", "pod"]);
        assert_eq!(t.intern("pod"), 1);
        assert_eq!(t.intern("pod"), 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_intern_appends_without_reordering() {
        let mut t = table(&["", "a"]);
        assert_eq!(t.intern("b"), 2);
        assert_eq!(t.resolve(1).unwrap(), "a");
        assert_eq!(t.resolve(2).unwrap(), "b");
    }

    #[test]
    fn test_intern_is_case_sensitive() {
        let mut t = table(&["pod"]);
        assert_eq!(t.intern("Pod"), 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let t = table(&["a"]);
        assert!(matches!(
            t.resolve(5),
            Err(StageError::SymbolOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_decode_labels() {
        let t = table(&["", "__name__", "up", "job", "api"]);
        let labels = decode_labels(&[1, 2, 3, 4], &t).unwrap();
        assert_eq!(labels.get("__name__").map(String::as_str), Some("up"));
        assert_eq!(labels.get("job").map(String::as_str), Some("api"));
    }

    #[test]
    fn test_decode_rejects_odd_refs() {
        let t = table(&["", "a"]);
        assert!(matches!(
            decode_labels(&[1, 1, 1], &t),
            Err(StageError::MalformedLabels { refs: 3 })
        ));
    }

    #[test]
    fn test_label_value_scans_pairs() {
        let t = table(&["", "pod", "checkout-6c8f9", "team", "ecommerce"]);
        let refs = [1, 2, 3, 4];
        assert_eq!(label_value(&refs, &t, "pod").unwrap(), Some("checkout-6c8f9"));
        assert_eq!(label_value(&refs, &t, "tier").unwrap(), None);
    }

    #[test]
    fn test_label_value_rejects_odd_refs() {
        let t = table(&["a"]);
        assert!(label_value(&[0], &t, "a").is_err());
    }

    #[test]
    fn test_encode_orders_by_name_and_reuses_symbols() {
        let mut t = table(&["", "zebra", "1"]);
        let mut labels = LabelMap::new();
        labels.insert("zebra".to_string(), "1".to_string());
        labels.insert("alpha".to_string(), "2".to_string());
        let refs = encode_labels(&labels, &mut t);
        // alpha sorts first and gets fresh indices; zebra reuses existing ones
        assert_eq!(refs, vec![3, 4, 1, 2]);
        assert_eq!(t.resolve(3).unwrap(), "alpha");
    }

    #[test]
    fn test_round_trip_preserves_mapping() {
        let mut t = table(&["", "b", "2", "a", "1"]);
        let original = decode_labels(&[1, 2, 3, 4], &t).unwrap();
        let refs = encode_labels(&original, &mut t);
        let decoded = decode_labels(&refs, &t).unwrap();
        assert_eq!(decoded, original);
    }
}
