use crate::query::definition::Query;
use crate::{QueryConfig, ScanConsistency};
use serde::{Deserialize, Serialize};

/// The `(query, scan consistency, collection)` triple in effect at one step
/// of a builder chain. Every narrowing call returns a new value; the receiver
/// is left untouched so partially built chains can be shared and forked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundQuery {
    query: Query,
    scan_consistency: ScanConsistency,
    collection: String,
}

impl BoundQuery {
    pub fn new(query: Query, scan_consistency: ScanConsistency, collection: impl Into<String>) -> Self {
        Self {
            query,
            scan_consistency,
            collection: collection.into(),
        }
    }

    /// Match-everything query with the configured defaults.
    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(
            Query::new(),
            config.default_scan_consistency(),
            config.default_collection(),
        )
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn scan_consistency(&self) -> ScanConsistency {
        self.scan_consistency
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    /// Replaces the query. A consistency carried by the query wins over the
    /// current one; otherwise the current consistency is kept.
    #[must_use]
    pub fn matching(&self, query: Query) -> Self {
        let scan_consistency = query.scan_consistency().unwrap_or(self.scan_consistency);
        Self {
            query,
            scan_consistency,
            collection: self.collection.clone(),
        }
    }

    #[must_use]
    pub fn consistent_with(&self, scan_consistency: ScanConsistency) -> Self {
        Self {
            scan_consistency,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn in_collection(&self, collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..self.clone()
        }
    }
}

impl Default for BoundQuery {
    fn default() -> Self {
        Self::from_config(&QueryConfig::default())
    }
}
