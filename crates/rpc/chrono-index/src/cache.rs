//! Samples observed during one resolution request.
//!
//! Every sample passes through [`SearchCache::insert`], which checks it against
//! its neighbours by height. A chain whose timestamps do not strictly increase
//! is rejected the moment two contradicting samples meet, whichever order they
//! were fetched in.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::{ChronoIndexError, ChronoIndexResult};
use crate::types::{find_bracket, Bracket, ChainSample};

/// Ordered, append-only set of samples keyed by height.
#[derive(Debug, Clone, Default)]
pub struct SearchCache {
    samples: BTreeMap<u64, i64>,
    latest_height: Option<u64>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, height: u64) -> Option<ChainSample> {
        self.samples
            .get(&height)
            .map(|timestamp| ChainSample::new(height, *timestamp))
    }

    /// Height of the chain head as first observed by this request.
    pub fn latest_height(&self) -> Option<u64> {
        self.latest_height
    }

    pub(crate) fn set_latest_height(&mut self, height: u64) {
        self.latest_height = Some(height);
    }

    /// Record a sample, rejecting it if it breaks strict monotonicity with
    /// the closest samples below or above it.
    pub fn insert(&mut self, sample: ChainSample) -> ChronoIndexResult<()> {
        if let Some(existing) = self.get(sample.height) {
            if existing.timestamp != sample.timestamp {
                return Err(ChronoIndexError::MonotonicityViolation {
                    lower: existing,
                    upper: sample,
                });
            }
            return Ok(());
        }

        let below = self
            .samples
            .range(..sample.height)
            .next_back()
            .map(|(h, t)| ChainSample::new(*h, *t));
        if let Some(lower) = below.filter(|lower| lower.timestamp >= sample.timestamp) {
            return Err(ChronoIndexError::MonotonicityViolation {
                lower,
                upper: sample,
            });
        }

        let above = self
            .samples
            .range((Bound::Excluded(sample.height), Bound::Unbounded))
            .next()
            .map(|(h, t)| ChainSample::new(*h, *t));
        if let Some(upper) = above.filter(|upper| upper.timestamp <= sample.timestamp) {
            return Err(ChronoIndexError::MonotonicityViolation {
                lower: sample,
                upper,
            });
        }

        self.samples.insert(sample.height, sample.timestamp);
        Ok(())
    }

    /// Tightest cached bracket around `timestamp`, if any.
    pub fn best_bracket(&self, timestamp: i64) -> Option<Bracket> {
        find_bracket(timestamp, &self.points())
    }

    pub fn points(&self) -> Vec<ChainSample> {
        self.samples
            .iter()
            .map(|(h, t)| ChainSample::new(*h, *t))
            .collect()
    }
}
