//! Destinations for identified records.
//!
//! An output descriptor is classified by prefix into a [`SinkKind`]; the
//! [`SinkRouter`] turns it into a concrete [`ItemSink`]. Console and local
//! file sinks are built in, the other kinds are provided by the embedding
//! application through [`SinkRouter::register`].

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SinkResult;
use crate::record::{IdentifiedRecord, ItemType};

pub mod console;
pub mod file;
pub mod memory;
pub mod router;

pub use console::ConsoleSink;
pub use file::LocalFileSink;
pub use memory::MemorySink;
pub use router::{SinkDescriptor, SinkFactory, SinkRouter};

/// Kind of destination an output descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    LocalFile,
    MessageBus,
    PubSub,
    Relational,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkKind::Console => "console",
            SinkKind::LocalFile => "local file",
            SinkKind::MessageBus => "message bus",
            SinkKind::PubSub => "pub/sub",
            SinkKind::Relational => "relational",
        };
        f.write_str(name)
    }
}

/// Classify an output descriptor.
///
/// Unrecognized non-empty descriptors are message bus addresses.
pub fn classify_sink(output: Option<&str>) -> SinkKind {
    let Some(output) = output.map(str::trim).filter(|o| !o.is_empty()) else {
        return SinkKind::Console;
    };
    if output.starts_with("projects") {
        SinkKind::PubSub
    } else if output.starts_with("postgresql") {
        SinkKind::Relational
    } else if output == "console" {
        SinkKind::Console
    } else if output.starts_with("file://")
        || output.ends_with(".json")
        || output.ends_with(".jsonl")
    {
        SinkKind::LocalFile
    } else {
        SinkKind::MessageBus
    }
}

/// Receives the records of streaming cycles.
///
/// [`deliver`](ItemSink::deliver) is called once per cycle with the whole
/// batch and must accept an empty one. A failure part way through a batch is
/// reported, never skipped; records carry stable identities so a redelivered
/// prefix can be deduplicated downstream.
#[async_trait]
pub trait ItemSink: Send + Sync {
    async fn open(&self) -> SinkResult<()> {
        Ok(())
    }

    async fn deliver(&self, records: &[IdentifiedRecord]) -> SinkResult<()>;

    async fn close(&self) -> SinkResult<()> {
        Ok(())
    }
}

/// Hand a complete cycle batch to a sink.
pub async fn deliver(sink: &dyn ItemSink, records: &[IdentifiedRecord]) -> SinkResult<()> {
    if records.is_empty() {
        tracing::debug!("empty batch, nothing to deliver");
    }
    sink.deliver(records).await
}

/// Topic names for message bus outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicNames {
    #[serde(default = "TopicNames::default_blocks")]
    pub blocks: String,
    #[serde(default = "TopicNames::default_transactions")]
    pub transactions: String,
    #[serde(default = "TopicNames::default_logs")]
    pub logs: String,
}

impl TopicNames {
    fn default_blocks() -> String {
        "blocks".to_string()
    }

    fn default_transactions() -> String {
        "transactions".to_string()
    }

    fn default_logs() -> String {
        "logs".to_string()
    }

    /// Topics of a pub/sub output: `<output>.blocks` and so on.
    pub fn for_pubsub(output: &str) -> Self {
        Self {
            blocks: format!("{output}.blocks"),
            transactions: format!("{output}.transactions"),
            logs: format!("{output}.logs"),
        }
    }

    pub fn topic_for(&self, item_type: ItemType) -> &str {
        match item_type {
            ItemType::Block => &self.blocks,
            ItemType::Transaction => &self.transactions,
            ItemType::Log => &self.logs,
        }
    }
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            blocks: Self::default_blocks(),
            transactions: Self::default_transactions(),
            logs: Self::default_logs(),
        }
    }
}

/// Partition a batch by item type, keeping the batch order within each type.
pub fn group_by_type(records: &[IdentifiedRecord]) -> BTreeMap<ItemType, Vec<&IdentifiedRecord>> {
    let mut groups: BTreeMap<ItemType, Vec<&IdentifiedRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.item_type()).or_default().push(record);
    }
    groups
}

/// Encode records as newline terminated JSON objects.
pub(crate) fn encode_json_lines<T: Serialize>(records: &[T]) -> SinkResult<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}
