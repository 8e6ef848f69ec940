//! Error types for node access.

use thiserror::Error;

/// Internal JSON-RPC error; the node also uses it for transient overload.
pub const INTERNAL_ERROR: i64 = -32603;
/// Server error range reserved by JSON-RPC for implementation-defined errors.
pub const SERVER_ERROR_RANGE: std::ops::RangeInclusive<i64> = -32099..=-32000;

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum NodeClientError {
    /// The request never produced a JSON-RPC response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response carried neither a result nor an error.
    #[error("node returned an empty response, it may not be synced")]
    NotSynced,

    /// A batch response had no entry for the request with this id.
    #[error("no response for request id {0}")]
    MissingResult(u64),

    /// The result could not be decoded into the expected type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl NodeClientError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            NodeClientError::Transport(_) | NodeClientError::NotSynced => true,
            NodeClientError::Rpc { code, .. } => {
                *code == INTERNAL_ERROR || SERVER_ERROR_RANGE.contains(code)
            }
            NodeClientError::MissingResult(_) | NodeClientError::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for NodeClientError {
    fn from(err: serde_json::Error) -> Self {
        NodeClientError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for NodeClientError {
    fn from(err: reqwest::Error) -> Self {
        NodeClientError::Transport(err.to_string())
    }
}

/// Result type for node access.
pub type NodeClientResult<T> = Result<T, NodeClientError>;
