use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chainetl_rpc_types::{RpcBlock, RpcReceipt};
use parking_lot::RwLock;

use crate::error::{NodeClientError, NodeClientResult};
use crate::NodeClient;

/// Error code the node uses for unknown heights and hashes.
const INVALID_PARAMS: i64 = -32602;

/// In-memory chain for tests and local runs.
///
/// Counts every call so tests can assert on the number of round trips, and can
/// be told to fail the next few calls with a transport error.
#[derive(Default)]
pub struct MockNodeClient {
    blocks: RwLock<BTreeMap<u64, RpcBlock>>,
    receipts: RwLock<HashMap<String, RpcReceipt>>,
    block_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    pending_failures: AtomicUsize,
}

impl MockNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of empty blocks with the given `(height, time_stamp)` pairs.
    pub fn with_timestamps(samples: impl IntoIterator<Item = (u64, i64)>) -> Self {
        let client = Self::new();
        for (height, time_stamp) in samples {
            client.insert_block(RpcBlock {
                height,
                block_hash: Some(format!("{height:064x}")),
                time_stamp: Some(time_stamp),
                ..Default::default()
            });
        }
        client
    }

    pub fn insert_block(&self, block: RpcBlock) {
        self.blocks.write().insert(block.height, block);
    }

    /// Register a receipt under its transaction hash.
    pub fn insert_receipt(&self, receipt: RpcReceipt) {
        let hash = receipt.tx_hash.clone().unwrap_or_default();
        self.receipts.write().insert(hash, receipt);
    }

    /// Make the next `count` calls fail with a retriable transport error.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of block lookups served, including the latest block.
    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> NodeClientResult<()> {
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(NodeClientError::Transport("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn get_block(&self, height: u64) -> NodeClientResult<RpcBlock> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.blocks
            .read()
            .get(&height)
            .cloned()
            .ok_or_else(|| NodeClientError::Rpc {
                code: INVALID_PARAMS,
                message: format!("fail wrong block height {height}"),
            })
    }

    async fn get_latest_block(&self) -> NodeClientResult<RpcBlock> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.blocks
            .read()
            .values()
            .next_back()
            .cloned()
            .ok_or(NodeClientError::NotSynced)
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> NodeClientResult<RpcReceipt> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.receipts
            .read()
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| NodeClientError::Rpc {
                code: INVALID_PARAMS,
                message: format!("invalid txHash {tx_hash}"),
            })
    }
}
