//! Configuration validation.
//!
//! Validates configuration and collects all errors before returning,
//! enabling users to fix multiple issues in a single iteration.

use crate::config::types::{EtlConfig, NodeConfig, ObservabilityConfig, StreamConfig};
use crate::errors::ConfigError;

/// Maximum request timeout: 5 minutes.
const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Maximum JSON-RPC batch size.
const MAX_BATCH_SIZE: usize = 1000;
/// Maximum blocks exported per cycle.
const MAX_BLOCK_BATCH_SIZE: u64 = 10_000;

/// Validate the entire configuration.
///
/// Collects all validation errors and returns them together, allowing users
/// to fix multiple issues at once.
pub fn validate_config(config: &EtlConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_node_config(&config.node, &mut errors);
    validate_stream_config(&config.stream, &mut errors);
    validate_observability_config(&config.observability, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}

fn validate_node_config(config: &NodeConfig, errors: &mut Vec<String>) {
    let uris: Vec<&str> = config
        .provider_uri
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .collect();

    if uris.is_empty() {
        errors.push("node.provider_uri cannot be empty".to_string());
    }

    for uri in uris {
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            errors.push(format!(
                "node.provider_uri entry '{}' must be an http:// or https:// URL",
                uri
            ));
        }
    }

    if config.request_timeout_ms == 0 || config.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
        errors.push(format!(
            "node.request_timeout_ms must be between 1 and {}",
            MAX_REQUEST_TIMEOUT_MS
        ));
    }

    if config.batch_size == 0 || config.batch_size > MAX_BATCH_SIZE {
        errors.push(format!(
            "node.batch_size must be between 1 and {}",
            MAX_BATCH_SIZE
        ));
    }
}

fn validate_stream_config(config: &StreamConfig, errors: &mut Vec<String>) {
    if config.last_synced_block_file.trim().is_empty() {
        errors.push("stream.last_synced_block_file cannot be empty".to_string());
    }

    if config.period_seconds == 0 {
        errors.push("stream.period_seconds must be at least 1 second".to_string());
    }

    if config.block_batch_size == 0 || config.block_batch_size > MAX_BLOCK_BATCH_SIZE {
        errors.push(format!(
            "stream.block_batch_size must be between 1 and {}",
            MAX_BLOCK_BATCH_SIZE
        ));
    }

    if config.entity_types.is_empty() {
        errors.push("stream.entity_types cannot be empty".to_string());
    }

    if let Some(output) = &config.output {
        if output.trim().is_empty() {
            errors.push("stream.output cannot be an empty string".to_string());
        }
    }

    for (name, topic) in [
        ("blocks", &config.topics.blocks),
        ("transactions", &config.topics.transactions),
        ("logs", &config.topics.logs),
    ] {
        if topic.trim().is_empty() {
            errors.push(format!("stream.topics.{} cannot be empty", name));
        }
    }
}

fn validate_observability_config(config: &ObservabilityConfig, errors: &mut Vec<String>) {
    let valid_levels = ["trace", "debug", "info", "warn", "warning", "error"];
    if !valid_levels.contains(&config.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_level '{}' is invalid. Valid levels: trace, debug, info, warn, error",
            config.log_level
        ));
    }

    let valid_formats = ["json", "pretty", "text", "human"];
    if !valid_formats.contains(&config.log_format.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_format '{}' is invalid. Valid formats: json, pretty",
            config.log_format
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(config: &EtlConfig) -> Vec<String> {
        match validate_config(config).unwrap_err() {
            ConfigError::ValidationFailed(errors) => errors,
            e => panic!("Expected ValidationFailed error, got {:?}", e),
        }
    }

    #[test]
    fn test_default_config_passes() {
        assert!(validate_config(&EtlConfig::default()).is_ok());
    }

    #[test]
    fn test_provider_uri_list_passes() {
        let mut config = EtlConfig::default();
        config.node.provider_uri =
            "https://a.example/api/v3, http://127.0.0.1:9000/api/v3".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_provider_uri_fails() {
        let mut config = EtlConfig::default();
        config.node.provider_uri = " , ".to_string();

        let errors = errors_of(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("node.provider_uri"));
    }

    #[test]
    fn test_provider_uri_scheme() {
        let mut config = EtlConfig::default();
        config.node.provider_uri = "ws://localhost:9000".to_string();

        let errors = errors_of(&config);
        assert!(errors.iter().any(|e| e.contains("ws://localhost:9000")));
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = EtlConfig::default();

        config.node.batch_size = 0;
        assert!(errors_of(&config).iter().any(|e| e.contains("node.batch_size")));

        config.node.batch_size = MAX_BATCH_SIZE + 1;
        assert!(errors_of(&config).iter().any(|e| e.contains("node.batch_size")));
    }

    #[test]
    fn test_zero_period_fails() {
        let mut config = EtlConfig::default();
        config.stream.period_seconds = 0;

        let errors = errors_of(&config);
        assert!(errors.iter().any(|e| e.contains("period_seconds")));
    }

    #[test]
    fn test_empty_topic_fails() {
        let mut config = EtlConfig::default();
        config.stream.topics.logs = String::new();

        let errors = errors_of(&config);
        assert_eq!(errors, vec!["stream.topics.logs cannot be empty".to_string()]);
    }

    #[test]
    fn test_invalid_log_settings() {
        let mut config = EtlConfig::default();
        config.observability.log_level = "verbose".to_string();
        config.observability.log_format = "xml".to_string();

        let errors = errors_of(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = EtlConfig::default();
        config.node.provider_uri = String::new();
        config.node.request_timeout_ms = 0;
        config.stream.block_batch_size = 0;
        config.stream.entity_types.clear();

        let errors = errors_of(&config);
        assert!(
            errors.len() >= 4,
            "Expected at least 4 errors, got {}",
            errors.len()
        );
    }
}
