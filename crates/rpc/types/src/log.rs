//! Event log entry of a receipt.

use serde::{Deserialize, Serialize};

/// Node event log representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEventLog {
    /// Emitting contract
    #[serde(default)]
    pub score_address: Option<String>,
    /// Event signature followed by the indexed arguments
    #[serde(default)]
    pub indexed: Vec<String>,
    /// Non-indexed arguments; the node emits `null` for absent values
    #[serde(default)]
    pub data: Vec<Option<String>>,
}

impl RpcEventLog {
    /// Non-indexed arguments with empty entries dropped, newlines stripped and
    /// double quotes turned into single quotes.
    pub fn sanitized_data(&self) -> Vec<String> {
        self.data
            .iter()
            .flatten()
            .filter(|item| !item.is_empty())
            .map(|item| item.replace('\n', "").replace('"', "'"))
            .collect()
    }
}
