//! Streaming export of correlated chain records.
//!
//! Each cycle fetches a range of blocks and the receipts of their
//! transactions, joins them into self-contained records, stamps every record
//! with a stable identity and a normalized time, and hands the batch to a
//! sink in one call.
//!
//! ```text
//! NodeClient ─► entity ─► correlate ─► identity ─► sink::deliver ─► ItemSink
//!                 ▲                                                    ▲
//!                 └──────────── StreamerAdapter::export_all ───────────┘
//! ```

pub mod adapter;
pub mod correlate;
pub mod entity;
pub mod error;
pub mod export;
pub mod identity;
pub mod record;
pub mod sink;
pub mod streamer;

pub use adapter::StreamerAdapter;
pub use correlate::{correlate_logs, correlate_transactions};
pub use entity::{Block, Log, Receipt, Transaction};
pub use error::{SinkError, SinkResult, StreamError, StreamResult};
pub use export::{
    export_block_range, export_blocks_and_transactions, export_receipts, export_receipts_and_logs,
    parse_transaction_hashes, ExportCounts, JsonLinesOutput,
};
pub use identity::{assign_identity, assign_timestamp, identify};
pub use record::{
    parse_entity_types, EnrichedLog, EnrichedRecord, EnrichedTransaction, EntityType,
    IdentifiedRecord, ItemType,
};
pub use sink::{classify_sink, deliver, group_by_type, ItemSink, SinkKind, SinkRouter, TopicNames};
pub use streamer::{read_checkpoint, write_checkpoint, Streamer, StreamerOptions};
