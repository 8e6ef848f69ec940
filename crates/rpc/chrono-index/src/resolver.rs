//! Timestamp and date ranges to block height ranges.

use chainetl_rpc_types::timestamp_scale;
use chrono::NaiveDate;

use crate::cache::SearchCache;
use crate::error::{ChronoIndexError, ChronoIndexResult};
use crate::search::InterpolationSearch;
use crate::store::ChainSampleStore;
use crate::types::BlockRangeResult;

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> ChronoIndexResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| ChronoIndexError::InvalidDate(format!("{input}: {e}")))
}

/// First and last epoch second of a UTC calendar day.
pub fn day_bounds(date: NaiveDate) -> ChronoIndexResult<(i64, i64)> {
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ChronoIndexError::InvalidDate(date.to_string()))?
        .and_utc()
        .timestamp();
    Ok((start, start + SECONDS_PER_DAY - 1))
}

/// Resolves wall-clock ranges to inclusive block height ranges.
#[derive(Clone)]
pub struct RangeResolver {
    store: ChainSampleStore,
}

impl RangeResolver {
    pub fn new(store: ChainSampleStore) -> Self {
        Self { store }
    }

    /// Blocks produced during the UTC day `date`.
    pub async fn resolve_for_date(&self, date: NaiveDate) -> ChronoIndexResult<BlockRangeResult> {
        let (start, end) = day_bounds(date)?;
        self.resolve_for_timestamps(start, end).await
    }

    /// Blocks whose timestamps fall in `[start_ts, end_ts]`, in epoch seconds.
    ///
    /// The start maps to the first height at or after `start_ts`, the end to
    /// the last height at or before the final instant of `end_ts`. Both bounds
    /// are scaled to the chain's native timestamp resolution before searching,
    /// so every block inside the end second is included.
    pub async fn resolve_for_timestamps(
        &self,
        start_ts: i64,
        end_ts: i64,
    ) -> ChronoIndexResult<BlockRangeResult> {
        if end_ts < start_ts {
            return Err(ChronoIndexError::InvalidRange {
                start: start_ts,
                end: end_ts,
            });
        }

        let mut cache = SearchCache::new();
        let first = self.store.first(&mut cache).await?;
        let last = self.store.last(&mut cache).await?;
        let scale = timestamp_scale(last.timestamp);
        let first_s = first.timestamp.div_euclid(scale);
        let last_s = last.timestamp.div_euclid(scale);
        for timestamp in [start_ts, end_ts] {
            if timestamp < first_s || timestamp > last_s {
                return Err(ChronoIndexError::OutOfBounds {
                    timestamp,
                    first: first_s,
                    last: last_s,
                });
            }
        }

        let start_native = start_ts.saturating_mul(scale).max(first.timestamp);
        let end_native = end_ts
            .saturating_mul(scale)
            .saturating_add(scale - 1)
            .min(last.timestamp);

        let search = InterpolationSearch::new(&self.store);
        let start = search.find_bracket(start_native, &mut cache).await?;
        let end = search.find_bracket(end_native, &mut cache).await?;

        tracing::debug!(
            start_ts,
            end_ts,
            scale,
            start_bracket = ?(start.lo, start.hi),
            end_bracket = ?(end.lo, end.hi),
            iterations = start.iterations + end.iterations,
            samples = cache.len(),
            "resolved timestamp range"
        );

        if start.hi > end.lo {
            return Err(ChronoIndexError::EmptyRange {
                start: start_ts,
                end: end_ts,
            });
        }
        Ok(BlockRangeResult {
            start_height: start.hi,
            end_height: end.lo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainetl_node_client::MockNodeClient;
    use std::sync::Arc;

    fn resolver_for(samples: impl IntoIterator<Item = (u64, i64)>) -> (Arc<MockNodeClient>, RangeResolver) {
        let client = Arc::new(MockNodeClient::with_timestamps(samples));
        let resolver = RangeResolver::new(ChainSampleStore::new(client.clone()));
        (client, resolver)
    }

    #[tokio::test]
    async fn test_linear_chain_range() {
        let (client, resolver) = resolver_for((0..=20).map(|h| (h, 1000 + h as i64)));

        let range = resolver.resolve_for_timestamps(1005, 1015).await.unwrap();
        assert_eq!(range.start_height, 5);
        assert_eq!(range.end_height, 15);
        // first, last and one interpolated sample per bound
        assert_eq!(client.block_calls(), 4);
    }

    #[tokio::test]
    async fn test_bounds_between_blocks() {
        let (_, resolver) = resolver_for((0..50).map(|h| (h, 10_000 + 10 * h as i64)));

        let range = resolver.resolve_for_timestamps(10_015, 10_095).await.unwrap();
        assert_eq!(range.start_height, 2);
        assert_eq!(range.end_height, 9);
    }

    #[tokio::test]
    async fn test_invalid_range_rejected_before_sampling() {
        let (client, resolver) = resolver_for([(0, 1), (1, 2)]);

        let err = resolver.resolve_for_timestamps(2, 1).await.unwrap_err();
        assert!(matches!(err, ChronoIndexError::InvalidRange { start: 2, end: 1 }));
        assert_eq!(client.block_calls(), 0);
    }

    #[tokio::test]
    async fn test_range_between_two_blocks_is_empty() {
        let (_, resolver) = resolver_for([(0, 100), (1, 110), (2, 120)]);

        let err = resolver.resolve_for_timestamps(101, 109).await.unwrap_err();
        assert!(matches!(err, ChronoIndexError::EmptyRange { .. }));
    }

    #[tokio::test]
    async fn test_single_second_on_block() {
        let (_, resolver) = resolver_for([(0, 100), (1, 110), (2, 120)]);

        let range = resolver.resolve_for_timestamps(110, 110).await.unwrap();
        assert_eq!((range.start_height, range.end_height), (1, 1));
    }

    #[tokio::test]
    async fn test_resolve_for_date() {
        // One block per hour starting 2020-01-01T00:30:00Z, in microseconds.
        let base = 1_577_838_600i64;
        let (_, resolver) =
            resolver_for((0..72).map(|h| (h, (base + 3600 * h as i64) * 1_000_000)));

        let date = parse_date("2020-01-02").unwrap();
        let range = resolver.resolve_for_date(date).await.unwrap();
        assert_eq!(range.start_height, 24);
        assert_eq!(range.end_height, 47);
    }

    #[tokio::test]
    async fn test_blocks_sharing_a_second() {
        let (_, resolver) = resolver_for([
            (0, 1_517_999_933_000_000),
            (1, 1_517_999_934_500_000),
            (2, 1_517_999_935_200_000),
            (3, 1_517_999_935_700_000),
            (4, 1_517_999_937_100_000),
            (5, 1_517_999_938_000_000),
        ]);

        let range = resolver
            .resolve_for_timestamps(1_517_999_935, 1_517_999_936)
            .await
            .unwrap();
        assert_eq!((range.start_height, range.end_height), (2, 3));

        let range = resolver
            .resolve_for_timestamps(1_517_999_935, 1_517_999_935)
            .await
            .unwrap();
        assert_eq!((range.start_height, range.end_height), (2, 3));
    }

    #[tokio::test]
    async fn test_end_second_includes_later_block() {
        let (_, resolver) = resolver_for([
            (0, 1_517_999_933_000_000),
            (1, 1_517_999_934_500_000),
            (2, 1_517_999_937_100_000),
            (3, 1_517_999_938_000_000),
        ]);

        let range = resolver
            .resolve_for_timestamps(1_517_999_937, 1_517_999_937)
            .await
            .unwrap();
        assert_eq!((range.start_height, range.end_height), (2, 2));

        let range = resolver
            .resolve_for_timestamps(1_517_999_933, 1_517_999_938)
            .await
            .unwrap();
        assert_eq!((range.start_height, range.end_height), (0, 3));
    }

    #[tokio::test]
    async fn test_out_of_bounds_reported_in_seconds() {
        let (_, resolver) = resolver_for([
            (0, 1_517_999_933_000_000),
            (1, 1_517_999_938_000_000),
        ]);

        let err = resolver
            .resolve_for_timestamps(1_517_999_930, 1_517_999_935)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChronoIndexError::OutOfBounds {
                timestamp: 1_517_999_930,
                first: 1_517_999_933,
                last: 1_517_999_938,
            }
        ));
    }

    #[tokio::test]
    async fn test_date_outside_chain() {
        let (_, resolver) = resolver_for([(0, 1_577_836_800), (1, 1_577_836_810)]);

        let date = parse_date("2019-12-31").unwrap();
        let err = resolver.resolve_for_date(date).await.unwrap_err();
        assert_eq!(err.predates_chain(), Some(true));
    }

    #[test]
    fn test_day_bounds() {
        let date = parse_date("2020-01-01").unwrap();
        assert_eq!(day_bounds(date).unwrap(), (1_577_836_800, 1_577_923_199));
        assert!(parse_date("2020-13-01").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chainetl_node_client::MockNodeClient;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn chain_strategy() -> impl Strategy<Value = Vec<i64>> {
        (
            0i64..2_000_000_000,
            prop::collection::vec(1i64..600, 1..400),
        )
            .prop_map(|(genesis, gaps)| {
                let mut timestamps = vec![genesis];
                for gap in gaps {
                    let next = timestamps[timestamps.len() - 1] + gap;
                    timestamps.push(next);
                }
                timestamps
            })
    }

    fn run<T>(fut: impl std::future::Future<Output = T>) -> T {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #[test]
        fn prop_range_bounds_hold(
            timestamps in chain_strategy(),
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let first = timestamps[0];
            let last = timestamps[timestamps.len() - 1];
            let span = (last - first) as f64;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let start_ts = first + (span * lo) as i64;
            let end_ts = first + (span * hi) as i64;

            let client = Arc::new(MockNodeClient::with_timestamps(
                timestamps.iter().enumerate().map(|(h, t)| (h as u64, *t)),
            ));
            let resolver = RangeResolver::new(ChainSampleStore::new(client));

            match run(resolver.resolve_for_timestamps(start_ts, end_ts)) {
                Ok(range) => {
                    prop_assert!(range.start_height <= range.end_height);
                    prop_assert!(timestamps[range.start_height as usize] >= start_ts);
                    prop_assert!(timestamps[range.end_height as usize] <= end_ts);
                    if range.start_height > 0 {
                        prop_assert!(timestamps[range.start_height as usize - 1] < start_ts);
                    }
                    if (range.end_height as usize) < timestamps.len() - 1 {
                        prop_assert!(timestamps[range.end_height as usize + 1] > end_ts);
                    }
                }
                Err(ChronoIndexError::EmptyRange { .. }) => {
                    prop_assert!(!timestamps.iter().any(|t| *t >= start_ts && *t <= end_ts));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn prop_exact_timestamp_collapses(timestamps in chain_strategy(), pick in any::<prop::sample::Index>()) {
            let height = pick.index(timestamps.len());
            let client = Arc::new(MockNodeClient::with_timestamps(
                timestamps.iter().enumerate().map(|(h, t)| (h as u64, *t)),
            ));
            let store = ChainSampleStore::new(client);
            let search = InterpolationSearch::new(&store);

            let outcome = run(search.find_bracket(timestamps[height], &mut SearchCache::new())).unwrap();
            prop_assert_eq!((outcome.lo, outcome.hi), (height as u64, height as u64));
        }

        #[test]
        fn prop_outside_chain_is_out_of_bounds(timestamps in chain_strategy(), below in 1i64..1_000) {
            let first = timestamps[0];
            let last = timestamps[timestamps.len() - 1];
            let client = Arc::new(MockNodeClient::with_timestamps(
                timestamps.iter().enumerate().map(|(h, t)| (h as u64, *t)),
            ));
            let resolver = RangeResolver::new(ChainSampleStore::new(client));

            let early = run(resolver.resolve_for_timestamps(first - below, first));
            let early_out_of_bounds = matches!(early, Err(ChronoIndexError::OutOfBounds { .. }));
            prop_assert!(early_out_of_bounds);
            let late = run(resolver.resolve_for_timestamps(last, last + below));
            let late_out_of_bounds = matches!(late, Err(ChronoIndexError::OutOfBounds { .. }));
            prop_assert!(late_out_of_bounds);
        }
    }
}
