use crate::ScanConsistency;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLLECTION: &str = "_default._default";

/// Defaults applied to a builder chain before any narrowing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryConfig {
    default_collection: String,
    default_scan_consistency: ScanConsistency,
}

impl QueryConfig {
    pub fn new(default_collection: impl Into<String>, default_scan_consistency: ScanConsistency) -> Self {
        Self {
            default_collection: default_collection.into(),
            default_scan_consistency,
        }
    }

    pub fn default_collection(&self) -> &str {
        self.default_collection.as_str()
    }

    pub fn default_scan_consistency(&self) -> ScanConsistency {
        self.default_scan_consistency
    }

    pub fn with_default_collection(self, default_collection: impl Into<String>) -> Self {
        Self {
            default_collection: default_collection.into(),
            ..self
        }
    }

    pub fn with_default_scan_consistency(self, default_scan_consistency: ScanConsistency) -> Self {
        Self {
            default_scan_consistency,
            ..self
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION, ScanConsistency::NotBounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.default_collection(), "_default._default");
        assert_eq!(config.default_scan_consistency(), ScanConsistency::NotBounded);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: QueryConfig =
            serde_json::from_str(r#"{"defaultScanConsistency": "REQUEST_PLUS"}"#).unwrap();
        assert_eq!(config.default_collection(), DEFAULT_COLLECTION);
        assert_eq!(config.default_scan_consistency(), ScanConsistency::RequestPlus);
    }
}
