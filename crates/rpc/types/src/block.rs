//! Block as returned by `icx_getBlockByHeight` / `icx_getLastBlock`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quantity;
use crate::transaction::RpcTransaction;

/// Node block representation.
///
/// Field names follow the node's snake_case block schema. The transaction list
/// is kept as raw JSON because the genesis block mixes non-object entries into
/// it; use [`RpcBlock::transactions`] to decode the real transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcBlock {
    /// Block height
    #[serde(deserialize_with = "quantity::u64")]
    pub height: u64,
    /// Block hash
    #[serde(default)]
    pub block_hash: Option<String>,
    /// Parent block hash
    #[serde(default)]
    pub prev_block_hash: Option<String>,
    /// Merkle root of the transaction list
    #[serde(default)]
    pub merkle_tree_root_hash: Option<String>,
    /// Block timestamp (microseconds on mainnet)
    #[serde(default, deserialize_with = "quantity::opt_i64")]
    pub time_stamp: Option<i64>,
    /// Block format version
    #[serde(default)]
    pub version: Option<String>,
    /// Producing peer
    #[serde(default)]
    pub peer_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub next_leader: Option<String>,
    /// Confirmed transactions, undecoded
    #[serde(default)]
    pub confirmed_transaction_list: Vec<Value>,
}

impl RpcBlock {
    /// Decode the object entries of the confirmed transaction list.
    ///
    /// Each transaction is paired with its position in the list, which is the
    /// fallback transaction index when the transaction carries none.
    pub fn transactions(&self) -> Result<Vec<(usize, RpcTransaction)>, serde_json::Error> {
        self.confirmed_transaction_list
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.is_object())
            .map(|(idx, tx)| Ok((idx, RpcTransaction::deserialize(tx)?)))
            .collect()
    }
}
