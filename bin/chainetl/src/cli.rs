use std::path::PathBuf;

use chainetl_operations::config::{load_config, validate_config};
use chainetl_operations::EtlConfig;
use chainetl_stream::parse_entity_types;
use clap::Args;

use crate::error::CliError;

#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Config YAML path (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Node endpoint; a comma separated list picks one at random
    #[arg(short = 'p', long)]
    pub provider_uri: Option<String>,

    /// Log level override
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format override (json or pretty)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DateRangeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// UTC day, YYYY-MM-DD
    #[arg(short = 'd', long)]
    pub date: String,

    /// Output file; stdout when omitted or "-"
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TimestampRangeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Start unix timestamp, in seconds
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub start_timestamp: i64,

    /// End unix timestamp, in seconds
    #[arg(short = 'e', long, allow_negative_numbers = true)]
    pub end_timestamp: i64,

    /// Output file; stdout when omitted or "-"
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExportBlocksArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// First block to export
    #[arg(short = 's', long, default_value_t = 0)]
    pub start_block: u64,

    /// Last block to export
    #[arg(short = 'e', long)]
    pub end_block: u64,

    /// Blocks exported per round
    #[arg(short = 'b', long, default_value_t = 100)]
    pub batch_size: u64,

    /// Blocks output file; "-" for stdout, not exported when omitted
    #[arg(long)]
    pub blocks_output: Option<String>,

    /// Transactions output file; "-" for stdout, not exported when omitted
    #[arg(long)]
    pub transactions_output: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExportReceiptsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// File with one transaction hash per line
    #[arg(short = 't', long)]
    pub transaction_hashes: PathBuf,

    /// Receipts exported per round
    #[arg(short = 'b', long, default_value_t = 100)]
    pub batch_size: usize,

    /// Receipts output file; "-" for stdout, not exported when omitted
    #[arg(long)]
    pub receipts_output: Option<String>,

    /// Logs output file; "-" for stdout, not exported when omitted
    #[arg(long)]
    pub logs_output: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StreamArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Checkpoint file holding the last synced block
    #[arg(short = 'l', long)]
    pub last_synced_block_file: Option<String>,

    /// Blocks to lag behind the network
    #[arg(long)]
    pub lag: Option<u64>,

    /// Sink: console, a file path or file:// URL, projects/... or a broker address
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// First block to export when there is no checkpoint
    #[arg(short = 's', long)]
    pub start_block: Option<u64>,

    /// Start syncing at the chain head when there is no checkpoint
    #[arg(long)]
    pub start_at_head: bool,

    /// Stop after exporting this block
    #[arg(long)]
    pub end_block: Option<u64>,

    /// Comma separated entity types, e.g. block,transaction,log
    #[arg(short = 'e', long)]
    pub entity_types: Option<String>,

    /// Seconds to sleep when there is nothing to sync
    #[arg(long)]
    pub period_seconds: Option<u64>,

    /// Requests per JSON-RPC batch
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Blocks per sync round
    #[arg(short = 'B', long)]
    pub block_batch_size: Option<u64>,

    /// Stop on the first failed round instead of retrying
    #[arg(long)]
    pub no_retry: bool,

    /// Message bus topic for blocks
    #[arg(long)]
    pub blocks_topic: Option<String>,

    /// Message bus topic for transactions
    #[arg(long)]
    pub transactions_topic: Option<String>,

    /// Message bus topic for logs
    #[arg(long)]
    pub logs_topic: Option<String>,
}

/// Resolve a config from: defaults < YAML < CLI flags.
pub fn resolve_config(common: &CommonArgs) -> Result<EtlConfig, CliError> {
    let mut config = match &common.config {
        Some(path) => load_config(path)?,
        None => EtlConfig::default(),
    };

    if let Some(v) = &common.provider_uri {
        config.node.provider_uri = v.clone();
    }
    if let Some(v) = &common.log_level {
        config.observability.log_level = v.clone();
    }
    if let Some(v) = &common.log_format {
        config.observability.log_format = v.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

/// Resolve the config of the `stream` command, applying its flags on top.
pub fn resolve_stream_config(args: &StreamArgs) -> Result<EtlConfig, CliError> {
    let mut config = resolve_config(&args.common)?;
    let stream = &mut config.stream;

    if let Some(v) = &args.last_synced_block_file {
        stream.last_synced_block_file = v.clone();
    }
    if let Some(v) = args.lag {
        stream.lag = v;
    }
    if let Some(v) = &args.output {
        stream.output = Some(v.clone());
    }
    if let Some(v) = &args.entity_types {
        stream.entity_types = parse_entity_types(v)?;
    }
    if let Some(v) = args.period_seconds {
        stream.period_seconds = v;
    }
    if let Some(v) = args.block_batch_size {
        stream.block_batch_size = v;
    }
    if args.no_retry {
        stream.retry_errors = false;
    }
    if let Some(v) = &args.blocks_topic {
        stream.topics.blocks = v.clone();
    }
    if let Some(v) = &args.transactions_topic {
        stream.topics.transactions = v.clone();
    }
    if let Some(v) = &args.logs_topic {
        stream.topics.logs = v.clone();
    }
    if let Some(v) = args.batch_size {
        config.node.batch_size = v;
    }

    validate_config(&config)?;
    Ok(config)
}
