//! One-shot exports to JSON lines files.
//!
//! [`export_block_range`] writes the blocks and transactions of a height
//! range, [`export_receipts`] the receipts and logs of a list of transaction
//! hashes. Both work in rounds and append each round to their outputs, so a
//! large range never sits in memory at once.

use std::path::PathBuf;

use chainetl_node_client::NodeClient;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::entity::{map_block, map_receipt, Block, Log, Receipt, Transaction};
use crate::error::{SinkResult, StreamError, StreamResult};
use crate::sink::encode_json_lines;

/// Fetch the blocks of `[start, end]` and the transactions they confirm.
pub async fn export_blocks_and_transactions(
    client: &dyn NodeClient,
    start: u64,
    end: u64,
) -> StreamResult<(Vec<Block>, Vec<Transaction>)> {
    if end < start {
        return Err(StreamError::Config(format!(
            "end block {end} is before start block {start}"
        )));
    }
    let heights: Vec<u64> = (start..=end).collect();
    let rpc_blocks = client.get_blocks(&heights).await?;

    let mut blocks = Vec::with_capacity(rpc_blocks.len());
    let mut transactions = Vec::new();
    for rpc_block in &rpc_blocks {
        let (block, block_transactions) = map_block(rpc_block)?;
        blocks.push(block);
        transactions.extend(block_transactions);
    }
    Ok((blocks, transactions))
}

/// Fetch the receipts of `tx_hashes` and the logs they carry.
pub async fn export_receipts_and_logs(
    client: &dyn NodeClient,
    tx_hashes: &[String],
) -> StreamResult<(Vec<Receipt>, Vec<Log>)> {
    if tx_hashes.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let rpc_receipts = client.get_transaction_receipts(tx_hashes).await?;
    let receipts = rpc_receipts
        .iter()
        .map(map_receipt)
        .collect::<StreamResult<Vec<_>>>()?;
    let logs = receipts.iter().flat_map(|r| r.logs.iter().cloned()).collect();
    Ok((receipts, logs))
}

/// Transaction hashes from a text file body, one per line.
pub fn parse_transaction_hashes(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Destination of a one-shot export: stdout for `-`, otherwise a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonLinesOutput {
    Stdout,
    File(PathBuf),
}

impl JsonLinesOutput {
    /// Output for a path, `file://` URL or `-`.
    pub fn from_output(output: &str) -> Self {
        match output.trim() {
            "-" => JsonLinesOutput::Stdout,
            path => JsonLinesOutput::File(PathBuf::from(path.strip_prefix("file://").unwrap_or(path))),
        }
    }

    /// Start an empty file, creating missing parent directories.
    pub async fn create(&self) -> SinkResult<()> {
        if let JsonLinesOutput::File(path) = self {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::File::create(path).await?;
        }
        Ok(())
    }

    pub async fn append<T: Serialize>(&self, items: &[T]) -> SinkResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let buf = encode_json_lines(items)?;
        match self {
            JsonLinesOutput::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&buf).await?;
                stdout.flush().await?;
            }
            JsonLinesOutput::File(path) => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(&buf).await?;
                file.flush().await?;
            }
        }
        Ok(())
    }
}

/// Totals of a one-shot export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportCounts {
    pub primary: usize,
    pub secondary: usize,
}

async fn create_outputs(outputs: [Option<&JsonLinesOutput>; 2]) -> StreamResult<()> {
    if outputs.iter().all(Option::is_none) {
        return Err(StreamError::Config(
            "at least one output must be provided".to_string(),
        ));
    }
    for output in outputs.into_iter().flatten() {
        output.create().await?;
    }
    Ok(())
}

/// Export blocks and transactions of `[start, end]`, `blocks_per_round`
/// heights at a time.
///
/// At least one output is required. `primary` counts blocks, `secondary`
/// transactions.
pub async fn export_block_range(
    client: &dyn NodeClient,
    start: u64,
    end: u64,
    blocks_per_round: u64,
    blocks_output: Option<&JsonLinesOutput>,
    transactions_output: Option<&JsonLinesOutput>,
) -> StreamResult<ExportCounts> {
    if end < start {
        return Err(StreamError::Config(format!(
            "end block {end} is before start block {start}"
        )));
    }
    create_outputs([blocks_output, transactions_output]).await?;

    let step = blocks_per_round.max(1);
    let mut counts = ExportCounts::default();
    let mut round_start = start;
    loop {
        let round_end = round_start.saturating_add(step - 1).min(end);
        let (blocks, transactions) =
            export_blocks_and_transactions(client, round_start, round_end).await?;
        if let Some(output) = blocks_output {
            output.append(&blocks).await?;
        }
        if let Some(output) = transactions_output {
            output.append(&transactions).await?;
        }
        counts.primary += blocks.len();
        counts.secondary += transactions.len();
        tracing::debug!(
            start = round_start,
            end = round_end,
            blocks = blocks.len(),
            transactions = transactions.len(),
            "exported blocks"
        );

        if round_end == end {
            break;
        }
        round_start = round_end + 1;
    }
    tracing::info!(
        start,
        end,
        blocks = counts.primary,
        transactions = counts.secondary,
        "block range exported"
    );
    Ok(counts)
}

/// Export the receipts and logs of `tx_hashes`, `hashes_per_round` at a time.
///
/// At least one output is required. `primary` counts receipts, `secondary`
/// logs.
pub async fn export_receipts(
    client: &dyn NodeClient,
    tx_hashes: &[String],
    hashes_per_round: usize,
    receipts_output: Option<&JsonLinesOutput>,
    logs_output: Option<&JsonLinesOutput>,
) -> StreamResult<ExportCounts> {
    create_outputs([receipts_output, logs_output]).await?;

    let mut counts = ExportCounts::default();
    for round in tx_hashes.chunks(hashes_per_round.max(1)) {
        let (receipts, logs) = export_receipts_and_logs(client, round).await?;
        if let Some(output) = receipts_output {
            output.append(&receipts).await?;
        }
        if let Some(output) = logs_output {
            output.append(&logs).await?;
        }
        counts.primary += receipts.len();
        counts.secondary += logs.len();
    }
    tracing::info!(
        receipts = counts.primary,
        logs = counts.secondary,
        "receipts exported"
    );
    Ok(counts)
}
