//! Shared lookup store types

use serde::{Deserialize, Serialize};

/// Enrichment record for one pod, as stored in the metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodMetadata {
    pub pod: String,
    pub service: String,
    pub team: String,
    pub tier: String,
}

/// One view duplication rule: the view's name plus the label names a derived
/// series retains from its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRule {
    pub view: String,
    pub labels: Vec<String>,
}

impl ViewRule {
    /// Whether a source label with this name survives into the derived
    /// series.
    pub fn retains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_rule_retains() {
        let rule = ViewRule {
            view: "operational".to_string(),
            labels: vec!["service".to_string(), "endpoint".to_string()],
        };
        assert!(rule.retains("service"));
        assert!(!rule.retains("team"));
    }

    #[test]
    fn test_view_rule_json_shape() {
        // Rules are stored as JSON documents; keep the shape stable.
        let json = r#"{"view":"business","labels":["service","tier"]}"#;
        let rule: ViewRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.view, "business");
        assert_eq!(rule.labels, vec!["service", "tier"]);
    }
}
