//! Export entities and their mapping from node responses.
//!
//! Mapping fixes the representation once: hashes carry a `0x` prefix,
//! contract addresses are lowercase, absent values stay `None`.

use chainetl_rpc_types::{fix_tx_hash, RpcBlock, RpcEventLog, RpcReceipt, RpcTransaction};
use serde::Serialize;
use serde_json::Value;

use crate::error::{StreamError, StreamResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub number: u64,
    pub hash: Option<String>,
    pub parent_hash: Option<String>,
    pub merkle_root_hash: Option<String>,
    /// As reported by the node, usually microseconds.
    pub timestamp: Option<i64>,
    pub version: Option<String>,
    pub transaction_count: usize,
    pub peer_id: Option<String>,
    pub signature: Option<String>,
    pub next_leader: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub version: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    /// Transferred amount in loop, zero when absent.
    pub value: u128,
    pub step_limit: Option<u128>,
    pub timestamp: Option<i64>,
    pub block_timestamp: Option<i64>,
    pub nid: Option<u64>,
    pub nonce: Option<u128>,
    pub hash: String,
    pub transaction_index: u64,
    pub block_hash: Option<String>,
    pub block_number: u64,
    pub fee: Option<u128>,
    pub signature: Option<String>,
    pub data_type: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub transaction_hash: String,
    pub transaction_index: Option<u64>,
    pub block_hash: Option<String>,
    pub block_number: Option<u64>,
    pub cumulative_step_used: Option<u128>,
    pub step_used: Option<u128>,
    pub step_price: Option<u128>,
    pub score_address: Option<String>,
    pub status: Option<u64>,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Log {
    /// Position in the receipt's event logs.
    pub log_index: u64,
    pub transaction_hash: String,
    pub transaction_index: Option<u64>,
    pub block_hash: Option<String>,
    pub block_number: Option<u64>,
    pub address: Option<String>,
    pub data: Vec<String>,
    pub indexed: Vec<String>,
}

/// Map a node block to a [`Block`] and its [`Transaction`]s.
pub fn map_block(rpc: &RpcBlock) -> StreamResult<(Block, Vec<Transaction>)> {
    let entries = rpc.transactions().map_err(|e| {
        StreamError::MalformedEntity(format!("block {} transactions: {e}", rpc.height))
    })?;

    let transactions = entries
        .iter()
        .map(|(position, tx)| map_transaction(tx, *position, rpc))
        .collect::<StreamResult<Vec<_>>>()?;

    let block = Block {
        number: rpc.height,
        hash: rpc.block_hash.clone(),
        parent_hash: rpc.prev_block_hash.clone(),
        merkle_root_hash: rpc.merkle_tree_root_hash.clone(),
        timestamp: rpc.time_stamp,
        version: rpc.version.clone(),
        transaction_count: transactions.len(),
        peer_id: rpc.peer_id.clone(),
        signature: rpc.signature.clone(),
        next_leader: rpc.next_leader.clone(),
    };
    Ok((block, transactions))
}

fn map_transaction(
    tx: &RpcTransaction,
    position: usize,
    block: &RpcBlock,
) -> StreamResult<Transaction> {
    let hash = tx.tx_hash.as_deref().map(fix_tx_hash).ok_or_else(|| {
        StreamError::MalformedEntity(format!(
            "transaction {position} of block {} has no hash",
            block.height
        ))
    })?;

    Ok(Transaction {
        version: tx.version.clone(),
        from_address: tx.from.clone(),
        to_address: tx.to.clone(),
        value: tx.value.unwrap_or(0),
        step_limit: tx.step_limit,
        timestamp: tx.timestamp,
        block_timestamp: block.time_stamp,
        nid: tx.nid,
        nonce: tx.nonce,
        hash,
        transaction_index: tx.tx_index.unwrap_or(position as u64),
        block_hash: block.block_hash.clone(),
        block_number: block.height,
        fee: tx.fee,
        signature: tx.signature.clone(),
        data_type: tx.data_type.clone(),
        data: tx.data.clone(),
    })
}

/// Map a node receipt, numbering its event logs by position.
pub fn map_receipt(rpc: &RpcReceipt) -> StreamResult<Receipt> {
    let transaction_hash = rpc
        .tx_hash
        .as_deref()
        .map(fix_tx_hash)
        .ok_or_else(|| StreamError::MalformedEntity("receipt has no transaction hash".into()))?;

    let logs = rpc
        .event_logs
        .iter()
        .enumerate()
        .map(|(index, log)| map_log(log, index as u64, &transaction_hash, rpc))
        .collect();

    Ok(Receipt {
        transaction_hash,
        transaction_index: rpc.tx_index,
        block_hash: rpc.block_hash.clone(),
        block_number: rpc.block_height,
        cumulative_step_used: rpc.cumulative_step_used,
        step_used: rpc.step_used,
        step_price: rpc.step_price,
        score_address: rpc.score_address.clone(),
        status: rpc.status,
        logs,
    })
}

fn map_log(log: &RpcEventLog, log_index: u64, transaction_hash: &str, receipt: &RpcReceipt) -> Log {
    Log {
        log_index,
        transaction_hash: transaction_hash.to_string(),
        transaction_index: receipt.tx_index,
        block_hash: receipt.block_hash.clone(),
        block_number: receipt.block_height,
        address: log.score_address.clone(),
        data: log.sanitized_data(),
        indexed: log.indexed.clone(),
    }
}
