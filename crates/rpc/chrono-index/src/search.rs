//! Interpolation search for the heights around a timestamp.
//!
//! Block production is close to periodic, so the height of a timestamp is
//! well predicted by a straight line through the current bracket. Each step
//! probes the interpolated height, then interpolates again inside the half
//! that still holds the target, and keeps the tightest bracket among the four
//! points. Probes are clamped strictly inside the bracket so every step
//! shrinks it, which bounds the search by plain bisection in the worst case.

use crate::cache::SearchCache;
use crate::error::{ChronoIndexError, ChronoIndexResult};
use crate::store::ChainSampleStore;
use crate::types::{find_bracket, Bracket, ChainSample, SearchOutcome};

/// Linear estimate of the height at `timestamp` between the bracket ends,
/// truncated toward the lower end.
fn interpolate(bracket: &Bracket, timestamp: i64) -> ChronoIndexResult<i128> {
    let (lo, hi) = (bracket.lo, bracket.hi);
    let span = i128::from(hi.timestamp) - i128::from(lo.timestamp);
    if span <= 0 {
        return Err(ChronoIndexError::MonotonicityViolation {
            lower: lo,
            upper: hi,
        });
    }
    let offset = (i128::from(timestamp) - i128::from(lo.timestamp))
        * (i128::from(hi.height) - i128::from(lo.height))
        / span;
    Ok(i128::from(lo.height) + offset)
}

/// Clamp a probe strictly inside `(lo, hi)`. Requires `hi - lo >= 2`.
fn clamp_inside(estimate: i128, lo: u64, hi: u64) -> u64 {
    let min = i128::from(lo) + 1;
    let max = i128::from(hi) - 1;
    // Bounded by two u64 heights, so the conversion cannot fail.
    u64::try_from(estimate.clamp(min, max)).unwrap_or(lo + 1)
}

/// Search engine over one [`ChainSampleStore`].
pub struct InterpolationSearch<'a> {
    store: &'a ChainSampleStore,
}

impl<'a> InterpolationSearch<'a> {
    pub fn new(store: &'a ChainSampleStore) -> Self {
        Self { store }
    }

    /// Find the tightest pair of heights whose timestamps enclose `timestamp`.
    ///
    /// Samples land in `cache`; a later search on the same cache starts from
    /// the best bracket already known.
    pub async fn find_bracket(
        &self,
        timestamp: i64,
        cache: &mut SearchCache,
    ) -> ChronoIndexResult<SearchOutcome> {
        let first = self.store.first(cache).await?;
        let last = self.store.last(cache).await?;
        if timestamp < first.timestamp || timestamp > last.timestamp {
            return Err(ChronoIndexError::OutOfBounds {
                timestamp,
                first: first.timestamp,
                last: last.timestamp,
            });
        }
        for endpoint in [first, last] {
            if endpoint.timestamp == timestamp {
                return Ok(exact(endpoint, 0));
            }
        }

        let mut bracket = cache
            .best_bracket(timestamp)
            .ok_or(ChronoIndexError::NoBracket(timestamp))?;
        let mut iterations = 0;

        loop {
            if bracket.lo.timestamp == timestamp {
                return Ok(exact(bracket.lo, iterations));
            }
            if bracket.hi.timestamp == timestamp {
                return Ok(exact(bracket.hi, iterations));
            }
            if bracket.height_gap() <= 1 {
                return Ok(SearchOutcome {
                    lo: bracket.lo.height,
                    hi: bracket.hi.height,
                    iterations,
                });
            }
            iterations += 1;

            let (lo, hi) = (bracket.lo.height, bracket.hi.height);
            let first_probe = clamp_inside(interpolate(&bracket, timestamp)?, lo, hi);
            let p1 = self.store.sample(first_probe, cache).await?;
            if p1.timestamp == timestamp {
                return Ok(exact(p1, iterations));
            }

            let half = if p1.timestamp < timestamp {
                Bracket::new(bracket.lo, p1)
            } else {
                Bracket::new(p1, bracket.hi)
            };
            let second_probe = clamp_inside(interpolate(&half, timestamp)?, lo, hi);
            let p2 = self.store.sample(second_probe, cache).await?;

            tracing::trace!(
                timestamp,
                lo,
                hi,
                first_probe,
                second_probe,
                "narrowing bracket"
            );

            bracket = find_bracket(timestamp, &[bracket.lo, p1, p2, bracket.hi])
                .ok_or(ChronoIndexError::NoBracket(timestamp))?;
        }
    }
}

fn exact(sample: ChainSample, iterations: u32) -> SearchOutcome {
    SearchOutcome {
        lo: sample.height,
        hi: sample.height,
        iterations,
    }
}
