//! Lazily fetched `(height, timestamp)` samples.

use std::sync::Arc;

use chainetl_node_client::NodeClient;
use chainetl_rpc_types::RpcBlock;

use crate::cache::SearchCache;
use crate::error::{ChronoIndexError, ChronoIndexResult};
use crate::types::ChainSample;

/// Samples block timestamps from the node, memoizing into a caller-owned
/// [`SearchCache`].
///
/// Timestamps keep the node's native resolution so blocks sharing a second
/// stay distinguishable.
///
/// Transport failures are returned unchanged; there are no retries here.
#[derive(Clone)]
pub struct ChainSampleStore {
    client: Arc<dyn NodeClient>,
    first_height: u64,
}

impl ChainSampleStore {
    pub fn new(client: Arc<dyn NodeClient>) -> Self {
        Self {
            client,
            first_height: 0,
        }
    }

    /// Treat `height` as the lowest block of the chain.
    pub fn with_first_height(mut self, height: u64) -> Self {
        self.first_height = height;
        self
    }

    pub fn first_height(&self) -> u64 {
        self.first_height
    }

    /// Sample at `height`, fetching it only if the cache does not hold it.
    pub async fn sample(
        &self,
        height: u64,
        cache: &mut SearchCache,
    ) -> ChronoIndexResult<ChainSample> {
        if let Some(sample) = cache.get(height) {
            return Ok(sample);
        }
        let block = self.client.get_block(height).await?;
        let sample = block_to_sample(&block)?;
        tracing::trace!(height, timestamp = sample.timestamp, "sampled block");
        cache.insert(sample)?;
        Ok(sample)
    }

    pub async fn first(&self, cache: &mut SearchCache) -> ChronoIndexResult<ChainSample> {
        self.sample(self.first_height, cache).await
    }

    /// Sample of the chain head.
    ///
    /// The head is fetched once per cache so both searches of a range
    /// resolution see the same chain.
    pub async fn last(&self, cache: &mut SearchCache) -> ChronoIndexResult<ChainSample> {
        if let Some(sample) = cache.latest_height().and_then(|h| cache.get(h)) {
            return Ok(sample);
        }
        let block = self.client.get_latest_block().await?;
        let sample = block_to_sample(&block)?;
        cache.insert(sample)?;
        cache.set_latest_height(sample.height);
        Ok(sample)
    }
}

fn block_to_sample(block: &RpcBlock) -> ChronoIndexResult<ChainSample> {
    let timestamp = block
        .time_stamp
        .ok_or(ChronoIndexError::MissingTimestamp(block.height))?;
    Ok(ChainSample::new(block.height, timestamp))
}
