//! One export cycle over an inclusive range of heights.

use std::sync::Arc;

use chainetl_node_client::NodeClient;

use crate::correlate::{correlate_logs, correlate_transactions};
use crate::entity::{Block, Log, Receipt, Transaction};
use crate::error::StreamResult;
use crate::export;
use crate::identity::identify;
use crate::record::{EnrichedRecord, EntityType};
use crate::sink::{self, ItemSink};

/// Fetches, correlates and delivers the records of a height range.
pub struct StreamerAdapter {
    client: Arc<dyn NodeClient>,
    sink: Arc<dyn ItemSink>,
    entity_types: Vec<EntityType>,
}

impl StreamerAdapter {
    pub fn new(
        client: Arc<dyn NodeClient>,
        sink: Arc<dyn ItemSink>,
        entity_types: Vec<EntityType>,
    ) -> Self {
        Self {
            client,
            sink,
            entity_types,
        }
    }

    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub async fn open(&self) -> StreamResult<()> {
        Ok(self.sink.open().await?)
    }

    pub async fn close(&self) -> StreamResult<()> {
        Ok(self.sink.close().await?)
    }

    pub async fn current_block_number(&self) -> StreamResult<u64> {
        Ok(self.client.latest_height().await?)
    }

    fn requested(&self, entity: EntityType) -> bool {
        self.entity_types.contains(&entity)
    }

    /// Whether `entity` must be fetched to produce the requested records.
    ///
    /// Logs come out of receipts and need their transaction's sender, so
    /// asking for logs pulls in transactions and receipts.
    pub fn should_export(&self, entity: EntityType) -> bool {
        match entity {
            EntityType::Block => true,
            EntityType::Transaction | EntityType::Receipt => {
                self.requested(EntityType::Transaction) || self.requested(EntityType::Log)
            }
            EntityType::Log => self.requested(EntityType::Log),
        }
    }

    /// Export `[start, end]` and deliver it as one batch: blocks, then
    /// transactions, then logs. Returns the number of records delivered.
    pub async fn export_all(&self, start: u64, end: u64) -> StreamResult<usize> {
        let (blocks, transactions) = self.export_blocks_and_transactions(start, end).await?;

        let (receipts, logs) =
            if self.should_export(EntityType::Receipt) || self.should_export(EntityType::Log) {
                self.export_receipts_and_logs(&transactions).await?
            } else {
                (Vec::new(), Vec::new())
            };

        let enriched_transactions = if self.requested(EntityType::Transaction) {
            correlate_transactions(&transactions, &receipts)?
        } else {
            Vec::new()
        };
        let enriched_logs = if self.requested(EntityType::Log) {
            correlate_logs(&blocks, &logs, &transactions)?
        } else {
            Vec::new()
        };
        let blocks = if self.requested(EntityType::Block) {
            blocks
        } else {
            Vec::new()
        };

        let records: Vec<EnrichedRecord> = blocks
            .into_iter()
            .map(EnrichedRecord::Block)
            .chain(enriched_transactions.into_iter().map(EnrichedRecord::Transaction))
            .chain(enriched_logs.into_iter().map(EnrichedRecord::Log))
            .collect();

        let identified = identify(records);
        tracing::info!(
            start,
            end,
            transactions = transactions.len(),
            receipts = receipts.len(),
            records = identified.len(),
            "delivering batch"
        );
        sink::deliver(self.sink.as_ref(), &identified).await?;
        Ok(identified.len())
    }

    async fn export_blocks_and_transactions(
        &self,
        start: u64,
        end: u64,
    ) -> StreamResult<(Vec<Block>, Vec<Transaction>)> {
        let (blocks, mut transactions) =
            export::export_blocks_and_transactions(self.client.as_ref(), start, end).await?;
        if !self.should_export(EntityType::Transaction) {
            transactions.clear();
        }
        Ok((blocks, transactions))
    }

    async fn export_receipts_and_logs(
        &self,
        transactions: &[Transaction],
    ) -> StreamResult<(Vec<Receipt>, Vec<Log>)> {
        let hashes: Vec<String> = transactions.iter().map(|tx| tx.hash.clone()).collect();
        let (receipts, mut logs) =
            export::export_receipts_and_logs(self.client.as_ref(), &hashes).await?;
        if !self.should_export(EntityType::Log) {
            logs.clear();
        }
        Ok((receipts, logs))
    }
}
