//! Wall-clock time to block height resolution.
//!
//! Block timestamps increase with height but not at a fixed rate, so a
//! timestamp cannot be mapped to a height arithmetically. This crate samples
//! the chain through a [`NodeClient`](chainetl_node_client::NodeClient) and
//! narrows a bracket of heights by interpolation until the bounding blocks are
//! found.
//!
//! ```text
//! RangeResolver ──► InterpolationSearch ──► ChainSampleStore ──► NodeClient
//!                          │                       │
//!                          └────── SearchCache ◄───┘
//! ```
//!
//! One [`SearchCache`] lives for one resolution request and is never shared
//! between requests, so independent resolutions can run concurrently.

pub mod cache;
pub mod error;
pub mod resolver;
pub mod search;
pub mod store;
pub mod types;

pub use cache::SearchCache;
pub use error::{ChronoIndexError, ChronoIndexResult};
pub use resolver::{day_bounds, parse_date, RangeResolver};
pub use search::InterpolationSearch;
pub use store::ChainSampleStore;
pub use types::{BlockRangeResult, Bracket, ChainSample, SearchOutcome};
