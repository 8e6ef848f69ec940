use chainetl_chrono_index::ChronoIndexError;
use chainetl_node_client::NodeClientError;
use chainetl_operations::ConfigError;
use chainetl_stream::{SinkError, StreamError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("node client: {0}")]
    Node(#[from] NodeClientError),

    #[error("{}", describe_range_error(.0))]
    Range(#[from] ChronoIndexError),

    #[error("stream: {0}")]
    Stream(#[from] StreamError),

    #[error("sink: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },
}

impl CliError {
    /// Out-of-range requests exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Range(ChronoIndexError::OutOfBounds { .. }) => 2,
            _ => 1,
        }
    }
}

fn describe_range_error(err: &ChronoIndexError) -> String {
    match err {
        ChronoIndexError::OutOfBounds {
            timestamp, first, ..
        } if timestamp < first => format!(
            "timestamp {timestamp} predates the first block (timestamp {first})"
        ),
        ChronoIndexError::OutOfBounds {
            timestamp, last, ..
        } => format!(
            "timestamp {timestamp} is not yet available: the latest block has timestamp {last}"
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_messages() {
        let early = CliError::from(ChronoIndexError::OutOfBounds {
            timestamp: 5,
            first: 10,
            last: 20,
        });
        assert_eq!(
            early.to_string(),
            "timestamp 5 predates the first block (timestamp 10)"
        );
        assert_eq!(early.exit_code(), 2);

        let late = CliError::from(ChronoIndexError::OutOfBounds {
            timestamp: 25,
            first: 10,
            last: 20,
        });
        assert!(late.to_string().contains("not yet available"));
        assert_eq!(late.exit_code(), 2);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = CliError::from(ChronoIndexError::InvalidRange { start: 9, end: 1 });
        assert_eq!(err.exit_code(), 1);
    }
}
