//! Configuration types for the exporter.

use std::path::PathBuf;
use std::time::Duration;

use chainetl_stream::{EntityType, StreamerOptions, TopicNames};
use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    /// Node connection settings.
    #[serde(default)]
    pub node: NodeConfig,

    /// Streaming export settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Node connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// JSON-RPC endpoint. A comma separated list picks one entry at random.
    #[serde(default = "NodeConfig::default_provider_uri")]
    pub provider_uri: String,

    /// Per-request timeout in milliseconds. Default: 10000.
    #[serde(default = "NodeConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum requests per JSON-RPC batch. Default: 10.
    #[serde(default = "NodeConfig::default_batch_size")]
    pub batch_size: usize,

    /// Height of the first block served by the node. Default: 0.
    #[serde(default)]
    pub first_height: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            provider_uri: Self::default_provider_uri(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            batch_size: Self::default_batch_size(),
            first_height: 0,
        }
    }
}

impl NodeConfig {
    fn default_provider_uri() -> String {
        "https://ctz.solidwallet.io/api/v3".to_string()
    }

    const fn default_request_timeout_ms() -> u64 {
        10_000
    }

    const fn default_batch_size() -> usize {
        10
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Streaming export settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Sink descriptor. `None` writes to the console.
    #[serde(default)]
    pub output: Option<String>,

    /// Checkpoint file holding the last exported height.
    #[serde(default = "StreamConfig::default_last_synced_block_file")]
    pub last_synced_block_file: String,

    /// Blocks to stay behind the head. Default: 0.
    #[serde(default)]
    pub lag: u64,

    /// Sleep between idle cycles, in seconds. Default: 10.
    #[serde(default = "StreamConfig::default_period_seconds")]
    pub period_seconds: u64,

    /// Maximum blocks exported per cycle. Default: 1.
    #[serde(default = "StreamConfig::default_block_batch_size")]
    pub block_batch_size: u64,

    /// Entities to export. Default: block, transaction, log.
    #[serde(default = "StreamConfig::default_entity_types")]
    pub entity_types: Vec<EntityType>,

    /// Keep going after a failed cycle. Default: true.
    #[serde(default = "StreamConfig::default_retry_errors")]
    pub retry_errors: bool,

    /// Topic names for message bus sinks.
    #[serde(default)]
    pub topics: TopicNames,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            output: None,
            last_synced_block_file: Self::default_last_synced_block_file(),
            lag: 0,
            period_seconds: Self::default_period_seconds(),
            block_batch_size: Self::default_block_batch_size(),
            entity_types: Self::default_entity_types(),
            retry_errors: Self::default_retry_errors(),
            topics: TopicNames::default(),
        }
    }
}

impl StreamConfig {
    fn default_last_synced_block_file() -> String {
        "last_synced_block.txt".to_string()
    }

    const fn default_period_seconds() -> u64 {
        10
    }

    const fn default_block_batch_size() -> u64 {
        1
    }

    fn default_entity_types() -> Vec<EntityType> {
        EntityType::ALL_FOR_STREAMING.to_vec()
    }

    const fn default_retry_errors() -> bool {
        true
    }

    /// Convert to the streamer's options. Start and end blocks come from the
    /// command line and are left unset.
    pub fn to_streamer_options(&self) -> StreamerOptions {
        StreamerOptions {
            last_synced_block_file: PathBuf::from(&self.last_synced_block_file),
            lag: self.lag,
            period: Duration::from_secs(self.period_seconds),
            block_batch_size: self.block_batch_size,
            retry_errors: self.retry_errors,
            ..StreamerOptions::default()
        }
    }
}

/// Observability configuration for logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level: trace, debug, info, warn, error. Default: info.
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty. Default: pretty.
    #[serde(default = "ObservabilityConfig::default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: Self::default_log_format(),
        }
    }
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_log_format() -> String {
        "pretty".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_node_config() {
        let config = NodeConfig::default();
        assert_eq!(config.provider_uri, "https://ctz.solidwallet.io/api/v3");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.first_height, 0);
    }

    #[test]
    fn test_default_stream_config() {
        let config = StreamConfig::default();
        assert!(config.output.is_none());
        assert_eq!(config.period_seconds, 10);
        assert_eq!(config.block_batch_size, 1);
        assert_eq!(
            config.entity_types,
            vec![EntityType::Block, EntityType::Transaction, EntityType::Log]
        );
        assert!(config.retry_errors);
        assert_eq!(config.topics.logs, "logs");
    }

    #[test]
    fn test_streamer_options_conversion() {
        let config = StreamConfig {
            last_synced_block_file: "/var/lib/etl/checkpoint".to_string(),
            lag: 5,
            period_seconds: 3,
            block_batch_size: 50,
            retry_errors: false,
            ..StreamConfig::default()
        };

        let options = config.to_streamer_options();

        assert_eq!(
            options.last_synced_block_file,
            PathBuf::from("/var/lib/etl/checkpoint")
        );
        assert_eq!(options.lag, 5);
        assert_eq!(options.period, Duration::from_secs(3));
        assert_eq!(options.block_batch_size, 50);
        assert!(!options.retry_errors);
        assert!(options.start_block.is_none());
        assert!(!options.start_at_head);
        assert!(options.end_block.is_none());
    }
}
