//! Error types for time to height resolution.

use chainetl_node_client::NodeClientError;
use thiserror::Error;

use crate::types::ChainSample;

/// Errors that can occur while resolving timestamps to heights.
#[derive(Debug, Error)]
pub enum ChronoIndexError {
    /// The timestamp lies outside the span covered by the chain.
    #[error("timestamp {timestamp} is out of bounds for chain timestamps {first}..={last}")]
    OutOfBounds { timestamp: i64, first: i64, last: i64 },

    /// Two samples contradict the strictly increasing timestamp precondition.
    #[error(
        "block timestamps must increase strictly with height: height {} has {} but height {} has {}",
        .lower.height, .lower.timestamp, .upper.height, .upper.timestamp
    )]
    MonotonicityViolation {
        lower: ChainSample,
        upper: ChainSample,
    },

    /// No pair of sampled points brackets the timestamp.
    #[error("unable to find bounds for timestamp {0}")]
    NoBracket(i64),

    /// The end of the range precedes its start.
    #[error("invalid range: end {end} is before start {start}")]
    InvalidRange { start: i64, end: i64 },

    /// The range falls between two consecutive blocks.
    #[error("the timestamp range {start}..={end} does not cover any blocks")]
    EmptyRange { start: i64, end: i64 },

    /// The block at this height carries no timestamp.
    #[error("block {0} has no timestamp")]
    MissingTimestamp(u64),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("node error: {0}")]
    Node(#[from] NodeClientError),
}

impl ChronoIndexError {
    /// For an out-of-bounds failure, whether the timestamp predates the
    /// first block (as opposed to lying past the latest one).
    pub fn predates_chain(&self) -> Option<bool> {
        match self {
            ChronoIndexError::OutOfBounds {
                timestamp, first, ..
            } => Some(timestamp < first),
            _ => None,
        }
    }
}

/// Result type for time to height resolution.
pub type ChronoIndexResult<T> = Result<T, ChronoIndexError>;
