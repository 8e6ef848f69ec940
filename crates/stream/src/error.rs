//! Error types for the streaming export.

use chainetl_node_client::NodeClientError;
use thiserror::Error;

use crate::sink::SinkKind;

/// Errors raised by sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// No factory is registered for the kind the output classified as.
    #[error("no sink available for {0} outputs")]
    Unsupported(SinkKind),

    /// The destination rejected part of a batch.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors that abort a streaming cycle.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A join produced a different number of rows than its driving side.
    #[error("expected {expected} correlated {entity} records, got {actual}")]
    CorrelationCardinalityMismatch {
        entity: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A node entity lacks a field the export cannot do without.
    #[error("malformed entity: {0}")]
    MalformedEntity(String),

    #[error("node error: {0}")]
    Node(#[from] NodeClientError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
