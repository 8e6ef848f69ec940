//! Error types for the operations crate.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error when loading config.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// Validation failed with one or more errors.
    #[error("config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_lists_every_error() {
        let err = ConfigError::ValidationFailed(vec![
            "node.provider_uri cannot be empty".to_string(),
            "stream.lag is too large".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("config validation failed:"));
        assert!(message.contains("node.provider_uri"));
        assert!(message.contains("stream.lag"));
    }
}
