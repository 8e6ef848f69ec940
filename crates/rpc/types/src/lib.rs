//! JSON-RPC wire types for the chain node.
//!
//! These types deserialize the responses of `icx_getBlockByHeight`,
//! `icx_getLastBlock` and `icx_getTransactionResult` exactly as the node
//! returns them. Integer quantities arrive as `0x` hex strings, decimal
//! strings or bare JSON numbers; [`quantity`] normalizes all three to native
//! integers so downstream code never sees the encoding.

pub mod block;
pub mod log;
pub mod quantity;
pub mod receipt;
pub mod request;
pub mod time;
pub mod transaction;

pub use block::RpcBlock;
pub use log::RpcEventLog;
pub use quantity::{fix_tx_hash, normalize_address, parse_quantity, QuantityError};
pub use receipt::RpcReceipt;
pub use request::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};
pub use time::{epoch_seconds_to_rfc3339, normalize_epoch_seconds, timestamp_scale};
pub use transaction::RpcTransaction;
