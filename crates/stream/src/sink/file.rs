use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{encode_json_lines, ItemSink};
use crate::error::SinkResult;
use crate::record::IdentifiedRecord;

/// Appends records as JSON lines to a local file.
///
/// The file is opened per batch so an external rotation takes effect on the
/// next cycle.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    path: PathBuf,
}

impl LocalFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink for an output descriptor, with any `file://` prefix removed.
    pub fn from_output(output: &str) -> Self {
        Self::new(output.strip_prefix("file://").unwrap_or(output))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemSink for LocalFileSink {
    async fn open(&self) -> SinkResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn deliver(&self, records: &[IdentifiedRecord]) -> SinkResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let buf = encode_json_lines(records)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "appended records");
        Ok(())
    }
}
