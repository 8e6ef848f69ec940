//! Transaction result as returned by `icx_getTransactionResult`.

use serde::{Deserialize, Serialize};

use crate::log::RpcEventLog;
use crate::quantity;

/// Node receipt representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Hash of the transaction this receipt belongs to
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub tx_index: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub block_height: Option<u64>,
    /// Steps used by all transactions of the block up to and including this one
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub cumulative_step_used: Option<u128>,
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub step_used: Option<u128>,
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub step_price: Option<u128>,
    /// Address of the deployed contract, for deploy transactions
    #[serde(default, deserialize_with = "quantity::opt_address")]
    pub score_address: Option<String>,
    /// `1` on success, `0` on failure
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub status: Option<u64>,
    #[serde(default)]
    pub event_logs: Vec<RpcEventLog>,
}
