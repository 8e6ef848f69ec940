//! Transaction entry of a block's confirmed transaction list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quantity;

/// Node transaction representation.
///
/// Version 3 transactions report `txHash`, legacy ones `tx_hash`; both land in
/// [`RpcTransaction::tx_hash`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    #[serde(default)]
    pub version: Option<String>,
    /// Sender address
    #[serde(default)]
    pub from: Option<String>,
    /// Recipient address
    #[serde(default)]
    pub to: Option<String>,
    /// Transferred value in loop
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub value: Option<u128>,
    /// Step limit
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub step_limit: Option<u128>,
    /// Wallet-assigned timestamp (resolution varies)
    #[serde(default, deserialize_with = "quantity::opt_i64")]
    pub timestamp: Option<i64>,
    /// Network id
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub nid: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub nonce: Option<u128>,
    /// Transaction hash, prefix not guaranteed
    #[serde(default, alias = "tx_hash")]
    pub tx_hash: Option<String>,
    /// Index within the block, if the node reports it
    #[serde(default, deserialize_with = "quantity::opt_u64")]
    pub tx_index: Option<u64>,
    /// Legacy fee field
    #[serde(default, deserialize_with = "quantity::opt_u128")]
    pub fee: Option<u128>,
    #[serde(default)]
    pub signature: Option<String>,
    /// Payload kind (`call`, `deploy`, `message`, ...)
    #[serde(default)]
    pub data_type: Option<String>,
    /// Payload, shape depends on `data_type`
    #[serde(default)]
    pub data: Option<Value>,
}
