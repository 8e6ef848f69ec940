//! Access to the chain node.
//!
//! [`NodeClient`] is the only way the rest of the workspace reaches the node.
//! [`JsonRpcNodeClient`] speaks JSON-RPC over HTTP; [`mock::MockNodeClient`]
//! serves an in-memory chain for tests and local runs.

use async_trait::async_trait;
use chainetl_rpc_types::{RpcBlock, RpcReceipt};

pub mod error;
pub mod json_rpc;
pub mod mock;

pub use error::{NodeClientError, NodeClientResult};
pub use json_rpc::{batch_responses, pick_provider_uri, JsonRpcNodeClient};
pub use mock::MockNodeClient;

/// Fetches chain entities from a node.
///
/// Failures are reported as-is; callers decide whether to retry using
/// [`NodeClientError::is_retriable`].
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Get the block at `height`.
    async fn get_block(&self, height: u64) -> NodeClientResult<RpcBlock>;

    /// Get the most recent block.
    async fn get_latest_block(&self) -> NodeClientResult<RpcBlock>;

    /// Get the receipt of the transaction with the given hash.
    async fn get_transaction_receipt(&self, tx_hash: &str) -> NodeClientResult<RpcReceipt>;

    /// Get several blocks, in the order of `heights`.
    async fn get_blocks(&self, heights: &[u64]) -> NodeClientResult<Vec<RpcBlock>> {
        let mut blocks = Vec::with_capacity(heights.len());
        for height in heights {
            blocks.push(self.get_block(*height).await?);
        }
        Ok(blocks)
    }

    /// Get several receipts, in the order of `tx_hashes`.
    async fn get_transaction_receipts(
        &self,
        tx_hashes: &[String],
    ) -> NodeClientResult<Vec<RpcReceipt>> {
        let mut receipts = Vec::with_capacity(tx_hashes.len());
        for hash in tx_hashes {
            receipts.push(self.get_transaction_receipt(hash).await?);
        }
        Ok(receipts)
    }

    /// Height of the most recent block.
    async fn latest_height(&self) -> NodeClientResult<u64> {
        Ok(self.get_latest_block().await?.height)
    }
}
