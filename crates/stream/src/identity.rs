//! Deduplication keys and normalized times for outgoing records.

use chainetl_rpc_types::{epoch_seconds_to_rfc3339, normalize_epoch_seconds};

use crate::record::{EnrichedRecord, IdentifiedRecord};

/// Stable identity of a record, derived only from its type and natural key.
pub fn assign_identity(record: &EnrichedRecord) -> String {
    match record {
        EnrichedRecord::Block(block) => format!("block_{}", block.number),
        EnrichedRecord::Transaction(tx) => format!("transaction_{}", tx.transaction.hash),
        EnrichedRecord::Log(log) => format!("log_{}_{}", log.transaction_hash, log.log_index),
    }
}

/// Time of the record's block as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Blocks use their own timestamp, everything else the carried block
/// timestamp. A record without one gets `None` and a warning.
pub fn assign_timestamp(record: &EnrichedRecord) -> Option<String> {
    let source = match record {
        EnrichedRecord::Block(block) => block.timestamp,
        EnrichedRecord::Transaction(tx) => tx.transaction.block_timestamp,
        EnrichedRecord::Log(log) => log.block_timestamp,
    };

    let rendered = source.and_then(|ts| epoch_seconds_to_rfc3339(normalize_epoch_seconds(ts)));
    if rendered.is_none() {
        tracing::warn!(
            item_type = %record.item_type(),
            item_id = %assign_identity(record),
            timestamp = ?source,
            "record has no usable timestamp"
        );
    }
    rendered
}

/// Attach identity and timestamp to every record of a batch.
pub fn identify(records: Vec<EnrichedRecord>) -> Vec<IdentifiedRecord> {
    records
        .into_iter()
        .map(|record| IdentifiedRecord {
            item_id: assign_identity(&record),
            item_timestamp: assign_timestamp(&record),
            record,
        })
        .collect()
}
