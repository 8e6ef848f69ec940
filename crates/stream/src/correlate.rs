//! Inner equi-joins between independently fetched entity batches.
//!
//! Every join is checked against the size of its driving side. A missing or
//! duplicated partner aborts the cycle instead of emitting a partial batch.

use std::collections::HashMap;
use std::hash::Hash;

use crate::entity::{Block, Log, Receipt, Transaction};
use crate::error::{StreamError, StreamResult};
use crate::record::{EnrichedLog, EnrichedTransaction};

/// Pair every left row with every right row sharing its key.
///
/// Rows without a partner are dropped; rows sharing a key on both sides yield
/// their cross product. Output follows the order of `left`.
fn inner_join<'a, L, R, K>(
    left: &'a [L],
    right: &'a [R],
    left_key: impl Fn(&'a L) -> K,
    right_key: impl Fn(&'a R) -> K,
) -> Vec<(&'a L, &'a R)>
where
    K: Eq + Hash,
{
    let mut by_key: HashMap<K, Vec<&R>> = HashMap::new();
    for row in right {
        by_key.entry(right_key(row)).or_default().push(row);
    }

    left.iter()
        .flat_map(|l| {
            by_key
                .get(&left_key(l))
                .into_iter()
                .flatten()
                .map(move |r| (l, *r))
        })
        .collect()
}

fn check_cardinality(entity: &'static str, expected: usize, actual: usize) -> StreamResult<()> {
    if expected != actual {
        return Err(StreamError::CorrelationCardinalityMismatch {
            entity,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Attach each transaction's receipt outcome, joined on the transaction hash.
pub fn correlate_transactions(
    transactions: &[Transaction],
    receipts: &[Receipt],
) -> StreamResult<Vec<EnrichedTransaction>> {
    let enriched: Vec<EnrichedTransaction> = inner_join(
        transactions,
        receipts,
        |tx| tx.hash.as_str(),
        |receipt| receipt.transaction_hash.as_str(),
    )
    .into_iter()
    .map(|(tx, receipt)| EnrichedTransaction {
        transaction: tx.clone(),
        receipt_cumulative_step_used: receipt.cumulative_step_used,
        receipt_step_used: receipt.step_used,
        receipt_step_price: receipt.step_price,
        receipt_score_address: receipt.score_address.clone(),
        receipt_logs: receipt.logs.clone(),
        receipt_status: receipt.status,
    })
    .collect();

    check_cardinality("transaction", transactions.len(), enriched.len())?;
    Ok(enriched)
}

/// Attach block time and hash to each log, then the sender of its
/// transaction.
pub fn correlate_logs(
    blocks: &[Block],
    logs: &[Log],
    transactions: &[Transaction],
) -> StreamResult<Vec<EnrichedLog>> {
    let with_blocks: Vec<EnrichedLog> = inner_join(
        logs,
        blocks,
        |log| log.block_number,
        |block| Some(block.number),
    )
    .into_iter()
    .map(|(log, block)| EnrichedLog {
        log_index: log.log_index,
        transaction_hash: log.transaction_hash.clone(),
        transaction_index: log.transaction_index,
        address: log.address.clone(),
        data: log.data.clone(),
        indexed: log.indexed.clone(),
        block_number: log.block_number,
        block_timestamp: block.timestamp,
        block_hash: block.hash.clone(),
        from_address: None,
    })
    .collect();

    let enriched: Vec<EnrichedLog> = inner_join(
        &with_blocks,
        transactions,
        |log| log.transaction_hash.as_str(),
        |tx| tx.hash.as_str(),
    )
    .into_iter()
    .map(|(log, tx)| EnrichedLog {
        from_address: tx.from_address.clone(),
        ..log.clone()
    })
    .collect();

    check_cardinality("log", logs.len(), enriched.len())?;
    Ok(enriched)
}
