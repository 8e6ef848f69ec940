//! The streaming loop: follow the chain head and export new blocks.
//!
//! Progress is a single integer, the last height delivered, kept in a text
//! file. It is written only after a cycle's batch has been delivered, so a
//! crash repeats at most one cycle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;

use crate::adapter::StreamerAdapter;
use crate::error::{StreamError, StreamResult};

/// Read the checkpoint file.
///
/// `-1` means nothing has been exported yet; anything lower is rejected.
pub async fn read_checkpoint(path: &Path) -> StreamResult<i64> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StreamError::Checkpoint(format!("{}: {e}", path.display())))?;
    let last_synced: i64 = contents
        .trim()
        .parse()
        .map_err(|e| StreamError::Checkpoint(format!("{}: {e}", path.display())))?;
    if last_synced < -1 {
        return Err(StreamError::Checkpoint(format!(
            "{}: last synced block {last_synced} is below -1",
            path.display()
        )));
    }
    Ok(last_synced)
}

/// Overwrite the checkpoint file.
pub async fn write_checkpoint(path: &Path, last_synced: i64) -> StreamResult<()> {
    tokio::fs::write(path, format!("{last_synced}\n"))
        .await
        .map_err(|e| StreamError::Checkpoint(format!("{}: {e}", path.display())))
}

/// Streaming loop settings.
#[derive(Debug, Clone)]
pub struct StreamerOptions {
    pub last_synced_block_file: PathBuf,
    /// First block to export when no checkpoint exists.
    pub start_block: Option<u64>,
    /// Start from the current head when no checkpoint exists.
    pub start_at_head: bool,
    /// Stop once this block has been exported.
    pub end_block: Option<u64>,
    /// Blocks to stay behind the head.
    pub lag: u64,
    /// Sleep between cycles that found nothing to export.
    pub period: Duration,
    /// Maximum number of blocks per cycle.
    pub block_batch_size: u64,
    /// Log failed cycles and try again instead of stopping.
    pub retry_errors: bool,
}

impl Default for StreamerOptions {
    fn default() -> Self {
        Self {
            last_synced_block_file: PathBuf::from("last_synced_block.txt"),
            start_block: None,
            start_at_head: false,
            end_block: None,
            lag: 0,
            period: Duration::from_secs(10),
            block_batch_size: 1,
            retry_errors: true,
        }
    }
}

/// Drives a [`StreamerAdapter`] from the checkpoint to the chain head.
pub struct Streamer {
    adapter: StreamerAdapter,
    options: StreamerOptions,
    last_synced_block: i64,
}

impl Streamer {
    pub fn new(adapter: StreamerAdapter, options: StreamerOptions) -> StreamResult<Self> {
        if options.start_block.is_some() && options.start_at_head {
            return Err(StreamError::Config(
                "start block and start at head are mutually exclusive".to_string(),
            ));
        }
        if options.block_batch_size == 0 {
            return Err(StreamError::Config(
                "block batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            adapter,
            options,
            last_synced_block: -1,
        })
    }

    pub fn last_synced_block(&self) -> i64 {
        self.last_synced_block
    }

    /// Create the checkpoint from the start options, or load the existing one.
    ///
    /// A start option together with an existing checkpoint is refused rather
    /// than silently overriding recorded progress.
    pub async fn init_checkpoint(&mut self) -> StreamResult<i64> {
        let path = self.options.last_synced_block_file.clone();
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StreamError::Checkpoint(format!("{}: {e}", path.display())))?;
        let start_requested = self.options.start_block.is_some() || self.options.start_at_head;

        if start_requested {
            if exists {
                return Err(StreamError::Checkpoint(format!(
                    "{} exists; delete it or drop the start block option",
                    path.display()
                )));
            }
            let start = match self.options.start_block {
                Some(start) => start,
                None => self.adapter.current_block_number().await?,
            };
            write_checkpoint(&path, start as i64 - 1).await?;
        } else if !exists {
            return Err(StreamError::Checkpoint(format!(
                "{} does not exist; a start block or start at head is required",
                path.display()
            )));
        }

        self.last_synced_block = read_checkpoint(&path).await?;
        tracing::info!(last_synced_block = self.last_synced_block, "loaded checkpoint");
        Ok(self.last_synced_block)
    }

    fn reached_end(&self) -> bool {
        self.options
            .end_block
            .is_some_and(|end| self.last_synced_block >= end as i64)
    }

    /// Export the next range, if any. Returns the number of blocks exported.
    pub async fn sync_cycle(&mut self) -> StreamResult<u64> {
        let head = self.adapter.current_block_number().await?;
        let mut target = (head.saturating_sub(self.options.lag) as i64)
            .min(self.last_synced_block + self.options.block_batch_size as i64);
        if let Some(end) = self.options.end_block {
            target = target.min(end as i64);
        }

        let blocks_to_sync = (target - self.last_synced_block).max(0) as u64;
        tracing::info!(
            head,
            last_synced_block = self.last_synced_block,
            target,
            blocks_to_sync,
            "sync cycle"
        );
        if blocks_to_sync == 0 {
            return Ok(0);
        }

        let start = (self.last_synced_block + 1) as u64;
        self.adapter.export_all(start, target as u64).await?;
        write_checkpoint(&self.options.last_synced_block_file, target).await?;
        self.last_synced_block = target;
        Ok(blocks_to_sync)
    }

    /// Run until shutdown is signalled or the end block is reached.
    pub async fn stream(&mut self, mut shutdown: watch::Receiver<bool>) -> StreamResult<()> {
        self.init_checkpoint().await?;
        self.adapter.open().await?;

        let result = self.run(&mut shutdown).await;
        let closed = self.adapter.close().await;
        result.and(closed)
    }

    async fn run(&mut self, shutdown: &mut watch::Receiver<bool>) -> StreamResult<()> {
        while !*shutdown.borrow() && !self.reached_end() {
            let synced = match self.sync_cycle().await {
                Ok(synced) => synced,
                Err(err) if self.options.retry_errors => {
                    tracing::error!(error = %err, "sync cycle failed, retrying");
                    0
                }
                Err(err) => return Err(err),
            };

            if synced == 0 && !self.reached_end() {
                tracing::info!(period = ?self.options.period, "nothing to sync, sleeping");
                tokio::select! {
                    _ = tokio::time::sleep(self.options.period) => {}
                    changed = shutdown.changed() => {
                        // Sender gone: nobody can signal anymore, keep pacing.
                        if changed.is_err() {
                            tokio::time::sleep(self.options.period).await;
                        }
                    }
                }
            }
        }
        tracing::info!(last_synced_block = self.last_synced_block, "streaming stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_chain;
    use crate::record::EntityType;
    use crate::sink::MemorySink;
    use chainetl_node_client::MockNodeClient;
    use std::sync::Arc;

    fn streamer(
        client: Arc<MockNodeClient>,
        options: StreamerOptions,
    ) -> (Arc<MemorySink>, Streamer) {
        let sink = Arc::new(MemorySink::new());
        let adapter = StreamerAdapter::new(
            client,
            sink.clone(),
            EntityType::ALL_FOR_STREAMING.to_vec(),
        );
        (sink, Streamer::new(adapter, options).unwrap())
    }

    fn options(dir: &tempfile::TempDir) -> StreamerOptions {
        StreamerOptions {
            last_synced_block_file: dir.path().join("last_synced_block.txt"),
            period: Duration::from_millis(10),
            ..StreamerOptions::default()
        }
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.txt");
        write_checkpoint(&path, -1).await.unwrap();
        assert_eq!(read_checkpoint(&path).await.unwrap(), -1);
        std::fs::write(&path, "garbage").unwrap();
        assert!(read_checkpoint(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_checkpoint_below_minus_one_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut streamer) = streamer(Arc::new(test_chain::mock_chain(10)), options(&dir));
        std::fs::write(dir.path().join("last_synced_block.txt"), "-5\n").unwrap();

        assert!(matches!(
            streamer.init_checkpoint().await,
            Err(StreamError::Checkpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_start_block_initializes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut streamer) = streamer(
            Arc::new(test_chain::mock_chain(10)),
            StreamerOptions {
                start_block: Some(4),
                ..options(&dir)
            },
        );
        assert_eq!(streamer.init_checkpoint().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_start_at_head() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut streamer) = streamer(
            Arc::new(test_chain::mock_chain(10)),
            StreamerOptions {
                start_at_head: true,
                ..options(&dir)
            },
        );
        assert_eq!(streamer.init_checkpoint().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_start_block_with_existing_checkpoint_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StreamerOptions {
            start_block: Some(0),
            ..options(&dir)
        };
        write_checkpoint(&opts.last_synced_block_file, 5).await.unwrap();

        let (_, mut streamer) = streamer(Arc::new(test_chain::mock_chain(10)), opts);
        assert!(matches!(
            streamer.init_checkpoint().await,
            Err(StreamError::Checkpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_checkpoint_without_start_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut streamer) = streamer(Arc::new(test_chain::mock_chain(3)), options(&dir));
        assert!(streamer.init_checkpoint().await.is_err());
    }

    #[test]
    fn test_conflicting_start_options() {
        let adapter = StreamerAdapter::new(
            Arc::new(MockNodeClient::new()),
            Arc::new(MemorySink::new()),
            vec![EntityType::Block],
        );
        let opts = StreamerOptions {
            start_block: Some(1),
            start_at_head: true,
            ..StreamerOptions::default()
        };
        assert!(matches!(
            Streamer::new(adapter, opts),
            Err(StreamError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_cycle_respects_batch_size_and_lag() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StreamerOptions {
            start_block: Some(0),
            block_batch_size: 4,
            lag: 3,
            ..options(&dir)
        };
        let path = opts.last_synced_block_file.clone();
        let (sink, mut streamer) = streamer(Arc::new(test_chain::mock_chain(10)), opts);
        streamer.init_checkpoint().await.unwrap();

        // head 9, lag 3: blocks up to 6 are eligible
        assert_eq!(streamer.sync_cycle().await.unwrap(), 4);
        assert_eq!(streamer.last_synced_block(), 3);
        assert_eq!(read_checkpoint(&path).await.unwrap(), 3);
        assert_eq!(streamer.sync_cycle().await.unwrap(), 3);
        assert_eq!(streamer.sync_cycle().await.unwrap(), 0);
        assert_eq!(read_checkpoint(&path).await.unwrap(), 6);

        let blocks = sink
            .records()
            .iter()
            .filter(|r| r.item_id.starts_with("block_"))
            .count();
        assert_eq!(blocks, 7);
        assert_eq!(sink.batches().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_until_end_block() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StreamerOptions {
            start_block: Some(2),
            end_block: Some(7),
            block_batch_size: 2,
            ..options(&dir)
        };
        let (sink, mut streamer) = streamer(Arc::new(test_chain::mock_chain(10)), opts);
        let (_tx, rx) = watch::channel(false);

        streamer.stream(rx).await.unwrap();
        assert_eq!(streamer.last_synced_block(), 7);
        assert_eq!(sink.batches().len(), 3);
        assert_eq!(sink.batches()[0][0].item_id, "block_2");
    }

    #[tokio::test]
    async fn test_failed_cycle_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StreamerOptions {
            start_block: Some(0),
            end_block: Some(2),
            block_batch_size: 10,
            ..options(&dir)
        };
        let (sink, mut streamer) = streamer(Arc::new(test_chain::mock_chain(5)), opts);
        sink.fail_next(1);
        let (_tx, rx) = watch::channel(false);

        streamer.stream(rx).await.unwrap();
        assert_eq!(sink.batches().len(), 1);
        assert_eq!(streamer.last_synced_block(), 2);
    }

    #[tokio::test]
    async fn test_failed_cycle_without_retry_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_synced_block.txt");
        let opts = StreamerOptions {
            start_block: Some(0),
            retry_errors: false,
            ..options(&dir)
        };
        let (sink, mut streamer) = streamer(Arc::new(test_chain::mock_chain(5)), opts);
        sink.fail_next(1);
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(
            streamer.stream(rx).await,
            Err(StreamError::Sink(_))
        ));
        assert_eq!(read_checkpoint(&path).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_loop() {
        let dir = tempfile::tempdir().unwrap();
        let opts = StreamerOptions {
            start_at_head: true,
            period: Duration::from_secs(3600),
            ..options(&dir)
        };
        let (_, mut streamer) = streamer(Arc::new(test_chain::mock_chain(3)), opts);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            streamer.stream(rx).await.map(|_| streamer.last_synced_block())
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let last = handle.await.unwrap().unwrap();
        assert_eq!(last, 2);
    }
}
