//! JSON-RPC 2.0 request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Method returning a block by height.
pub const METHOD_GET_BLOCK_BY_HEIGHT: &str = "icx_getBlockByHeight";
/// Method returning the latest block.
pub const METHOD_GET_LAST_BLOCK: &str = "icx_getLastBlock";
/// Method returning a transaction result (receipt).
pub const METHOD_GET_TRANSACTION_RESULT: &str = "icx_getTransactionResult";

/// A single JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }

    /// `icx_getBlockByHeight` with the height hex encoded.
    pub fn get_block_by_height(height: u64, id: u64) -> Self {
        Self::new(
            METHOD_GET_BLOCK_BY_HEIGHT,
            json!({ "height": format!("{height:#x}") }),
            id,
        )
    }

    pub fn get_last_block(id: u64) -> Self {
        Self::new(METHOD_GET_LAST_BLOCK, json!({}), id)
    }

    pub fn get_transaction_result(tx_hash: &str, id: u64) -> Self {
        Self::new(
            METHOD_GET_TRANSACTION_RESULT,
            json!({ "txHash": tx_hash }),
            id,
        )
    }
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A single JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}
