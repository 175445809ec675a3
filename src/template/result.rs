use serde::{Deserialize, Serialize};

/// Position of a mutation in the store's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationToken {
    pub bucket_name: String,
    pub partition_id: u16,
    pub partition_uuid: u64,
    pub sequence_number: u64,
}

/// Outcome of removing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    /// The id of the removed document.
    pub id: String,
    /// Revision token issued by the removal; `0` when the store has none.
    pub cas: u64,
    pub mutation_token: Option<MutationToken>,
}
