use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{encode_json_lines, ItemSink};
use crate::error::SinkResult;
use crate::record::IdentifiedRecord;

/// Prints each record as one JSON line on stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ItemSink for ConsoleSink {
    async fn deliver(&self, records: &[IdentifiedRecord]) -> SinkResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let buf = encode_json_lines(records)?;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&buf).await?;
        stdout.flush().await?;
        Ok(())
    }
}
