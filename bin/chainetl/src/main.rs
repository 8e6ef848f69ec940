//! chainetl: block range lookup and streaming export.
//!
//! ## Usage
//!
//! ```bash
//! # Blocks produced on a UTC day
//! chainetl get-block-range-for-date --date 2021-03-01
//!
//! # Blocks between two unix timestamps, written to a file
//! chainetl get-block-range-for-timestamps -s 1614556800 -e 1614643199 -o range.csv
//!
//! # Export blocks and transactions of a height range
//! chainetl export-blocks-and-transactions -s 0 -e 500 --blocks-output blocks.json \
//!     --transactions-output transactions.json
//!
//! # Export receipts and logs of the transactions listed in a file
//! chainetl export-receipts-and-logs -t transaction_hashes.txt --receipts-output receipts.json
//!
//! # Stream blocks, transactions and logs to a JSON lines file
//! chainetl stream --start-block 30000000 -o file:///var/lib/chainetl/items.jsonl
//! ```
//!
//! Range commands print `start,end`; export commands write JSON lines. Every
//! command accepts `--config` with a YAML file; flags override its values.

mod cli;
mod error;

use std::sync::Arc;

use chainetl_chrono_index::{parse_date, BlockRangeResult, ChainSampleStore, RangeResolver};
use chainetl_node_client::{JsonRpcNodeClient, NodeClient};
use chainetl_operations::{init_tracing_from_config, EtlConfig, SignalHandler};
use chainetl_stream::{
    export_block_range, export_receipts, parse_transaction_hashes, ExportCounts, JsonLinesOutput,
    SinkRouter, Streamer, StreamerAdapter,
};
use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;

use cli::{
    resolve_config, resolve_stream_config, DateRangeArgs, ExportBlocksArgs, ExportReceiptsArgs,
    StreamArgs, TimestampRangeArgs,
};
use error::CliError;

#[derive(Parser)]
#[command(name = "chainetl")]
#[command(about = "Block range lookup and streaming export for ICON-style chains")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output the first and last block produced on a UTC day
    GetBlockRangeForDate(DateRangeArgs),
    /// Output the first and last block between two unix timestamps
    GetBlockRangeForTimestamps(TimestampRangeArgs),
    /// Export blocks and transactions of a height range as JSON lines
    ExportBlocksAndTransactions(ExportBlocksArgs),
    /// Export receipts and logs of listed transactions as JSON lines
    ExportReceiptsAndLogs(ExportReceiptsArgs),
    /// Stream blocks, transactions and logs to a sink
    Stream(StreamArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli.command).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("chainetl: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::GetBlockRangeForDate(args) => {
            let config = resolve_config(&args.common)?;
            init_tracing_from_config(&config.observability);
            let date = parse_date(&args.date)?;
            let range = range_resolver(&config, connect(&config)?)
                .resolve_for_date(date)
                .await?;
            write_range(args.output.as_deref(), range).await
        }
        Commands::GetBlockRangeForTimestamps(args) => {
            let config = resolve_config(&args.common)?;
            init_tracing_from_config(&config.observability);
            let range = range_resolver(&config, connect(&config)?)
                .resolve_for_timestamps(args.start_timestamp, args.end_timestamp)
                .await?;
            write_range(args.output.as_deref(), range).await
        }
        Commands::ExportBlocksAndTransactions(args) => {
            let config = resolve_config(&args.common)?;
            init_tracing_from_config(&config.observability);
            export_blocks(connect(&config)?.as_ref(), &args).await?;
            Ok(())
        }
        Commands::ExportReceiptsAndLogs(args) => {
            let config = resolve_config(&args.common)?;
            init_tracing_from_config(&config.observability);
            export_receipts_and_logs(connect(&config)?.as_ref(), &args).await?;
            Ok(())
        }
        Commands::Stream(args) => {
            let config = resolve_stream_config(&args)?;
            init_tracing_from_config(&config.observability);

            let signal_handler = SignalHandler::new();
            signal_handler.start();

            let client = connect(&config)?;
            let mut streamer = build_streamer(&config, &args, client)?;
            streamer.stream(signal_handler.subscribe()).await?;
            tracing::info!(
                last_synced_block = streamer.last_synced_block(),
                "streamer stopped"
            );
            Ok(())
        }
    }
}

fn connect(config: &EtlConfig) -> Result<Arc<dyn NodeClient>, CliError> {
    let client = JsonRpcNodeClient::from_provider_uri(
        &config.node.provider_uri,
        config.node.request_timeout(),
        config.node.batch_size,
    )?;
    tracing::info!(url = client.url(), "using node endpoint");
    Ok(Arc::new(client))
}

fn range_resolver(config: &EtlConfig, client: Arc<dyn NodeClient>) -> RangeResolver {
    RangeResolver::new(ChainSampleStore::new(client).with_first_height(config.node.first_height))
}

fn build_streamer(
    config: &EtlConfig,
    args: &StreamArgs,
    client: Arc<dyn NodeClient>,
) -> Result<Streamer, CliError> {
    let router = SinkRouter::new(config.stream.topics.clone());
    let sink = router.build(config.stream.output.as_deref())?;

    let adapter = StreamerAdapter::new(client, sink, config.stream.entity_types.clone());

    let mut options = config.stream.to_streamer_options();
    options.start_block = args.start_block;
    options.start_at_head = args.start_at_head;
    options.end_block = args.end_block;

    Ok(Streamer::new(adapter, options)?)
}

fn json_lines_output(output: Option<&str>) -> Option<JsonLinesOutput> {
    output.map(JsonLinesOutput::from_output)
}

async fn export_blocks(
    client: &dyn NodeClient,
    args: &ExportBlocksArgs,
) -> Result<ExportCounts, CliError> {
    let blocks = json_lines_output(args.blocks_output.as_deref());
    let transactions = json_lines_output(args.transactions_output.as_deref());
    Ok(export_block_range(
        client,
        args.start_block,
        args.end_block,
        args.batch_size,
        blocks.as_ref(),
        transactions.as_ref(),
    )
    .await?)
}

async fn export_receipts_and_logs(
    client: &dyn NodeClient,
    args: &ExportReceiptsArgs,
) -> Result<ExportCounts, CliError> {
    let contents = tokio::fs::read_to_string(&args.transaction_hashes)
        .await
        .map_err(|source| CliError::Input {
            path: args.transaction_hashes.display().to_string(),
            source,
        })?;
    let hashes = parse_transaction_hashes(&contents);
    let receipts = json_lines_output(args.receipts_output.as_deref());
    let logs = json_lines_output(args.logs_output.as_deref());
    Ok(export_receipts(client, &hashes, args.batch_size, receipts.as_ref(), logs.as_ref()).await?)
}

fn format_range(range: BlockRangeResult) -> String {
    format!("{},{}\n", range.start_height, range.end_height)
}

/// Write `start,end` to `output`, or stdout when it is absent or `-`.
async fn write_range(output: Option<&str>, range: BlockRangeResult) -> Result<(), CliError> {
    let line = format_range(range);
    match output {
        None | Some("-") => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        Some(path) => tokio::fs::write(path, line).await?,
    }
    Ok(())
}
