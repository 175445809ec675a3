use serde::{Deserialize, Serialize};
use std::fmt;

/// How fresh the index must be before a query result is considered valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanConsistency {
    /// Read whatever the index currently holds.
    #[default]
    NotBounded,
    /// Wait until every mutation issued before the query is indexed.
    RequestPlus,
}

impl fmt::Display for ScanConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanConsistency::NotBounded => write!(f, "not_bounded"),
            ScanConsistency::RequestPlus => write!(f, "request_plus"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ScanConsistency::RequestPlus).unwrap();
        assert_eq!(json, "\"REQUEST_PLUS\"");
        let parsed: ScanConsistency = serde_json::from_str("\"NOT_BOUNDED\"").unwrap();
        assert_eq!(parsed, ScanConsistency::NotBounded);
    }
}
