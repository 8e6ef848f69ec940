//! Records as they leave the export.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::{Block, Log, Transaction};
use crate::error::StreamError;

/// Entities the export can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Block,
    Transaction,
    Receipt,
    Log,
}

impl EntityType {
    /// Default selection when streaming.
    pub const ALL_FOR_STREAMING: [EntityType; 3] =
        [EntityType::Block, EntityType::Transaction, EntityType::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Block => "block",
            EntityType::Transaction => "transaction",
            EntityType::Receipt => "receipt",
            EntityType::Log => "log",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "block" => Ok(EntityType::Block),
            "transaction" => Ok(EntityType::Transaction),
            "receipt" => Ok(EntityType::Receipt),
            "log" => Ok(EntityType::Log),
            other => Err(StreamError::InvalidEntityType(other.to_string())),
        }
    }
}

/// Parse a comma separated list such as `block,transaction,log`.
pub fn parse_entity_types(input: &str) -> Result<Vec<EntityType>, StreamError> {
    let mut types = Vec::new();
    for part in input.split(',').filter(|p| !p.trim().is_empty()) {
        let entity: EntityType = part.parse()?;
        if !types.contains(&entity) {
            types.push(entity);
        }
    }
    if types.is_empty() {
        return Err(StreamError::InvalidEntityType(input.to_string()));
    }
    Ok(types)
}

/// Kind of an outgoing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Block,
    Transaction,
    Log,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Block => "block",
            ItemType::Transaction => "transaction",
            ItemType::Log => "log",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction carrying the outcome of its receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub receipt_cumulative_step_used: Option<u128>,
    pub receipt_step_used: Option<u128>,
    pub receipt_step_price: Option<u128>,
    pub receipt_score_address: Option<String>,
    pub receipt_logs: Vec<Log>,
    pub receipt_status: Option<u64>,
}

/// Event log carrying its block's time and hash and its sender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedLog {
    pub log_index: u64,
    pub transaction_hash: String,
    pub transaction_index: Option<u64>,
    pub address: Option<String>,
    pub data: Vec<String>,
    pub indexed: Vec<String>,
    pub block_number: Option<u64>,
    pub block_timestamp: Option<i64>,
    pub block_hash: Option<String>,
    pub from_address: Option<String>,
}

/// A correlated record, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnrichedRecord {
    Block(Block),
    Transaction(EnrichedTransaction),
    Log(EnrichedLog),
}

impl EnrichedRecord {
    pub fn item_type(&self) -> ItemType {
        match self {
            EnrichedRecord::Block(_) => ItemType::Block,
            EnrichedRecord::Transaction(_) => ItemType::Transaction,
            EnrichedRecord::Log(_) => ItemType::Log,
        }
    }
}

/// A record with its deduplication key and normalized time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifiedRecord {
    #[serde(flatten)]
    pub record: EnrichedRecord,
    pub item_id: String,
    pub item_timestamp: Option<String>,
}

impl IdentifiedRecord {
    pub fn item_type(&self) -> ItemType {
        self.record.item_type()
    }
}
