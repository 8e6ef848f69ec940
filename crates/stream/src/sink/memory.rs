use async_trait::async_trait;
use parking_lot::Mutex;

use super::ItemSink;
use crate::error::{SinkError, SinkResult};
use crate::record::IdentifiedRecord;

/// Keeps delivered batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<IdentifiedRecord>>>,
    pending_failures: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivered batch, in delivery order.
    pub fn batches(&self) -> Vec<Vec<IdentifiedRecord>> {
        self.batches.lock().clone()
    }

    /// All delivered records, flattened.
    pub fn records(&self) -> Vec<IdentifiedRecord> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Make the next `count` deliveries fail.
    pub fn fail_next(&self, count: usize) {
        *self.pending_failures.lock() = count;
    }
}

#[async_trait]
impl ItemSink for MemorySink {
    async fn deliver(&self, records: &[IdentifiedRecord]) -> SinkResult<()> {
        {
            let mut pending = self.pending_failures.lock();
            if *pending > 0 {
                *pending -= 1;
                return Err(SinkError::Delivery("injected failure".to_string()));
            }
        }
        self.batches.lock().push(records.to_vec());
        Ok(())
    }
}
