//! Core types for time to height resolution.

use serde::{Deserialize, Serialize};

/// A block height paired with its timestamp in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainSample {
    pub height: u64,
    pub timestamp: i64,
}

impl ChainSample {
    pub const fn new(height: u64, timestamp: i64) -> Self {
        Self { height, timestamp }
    }
}

/// Two samples whose timestamps enclose a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub lo: ChainSample,
    pub hi: ChainSample,
}

impl Bracket {
    pub const fn new(lo: ChainSample, hi: ChainSample) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.lo.timestamp <= timestamp && timestamp <= self.hi.timestamp
    }

    /// Number of heights between the two ends, zero when they coincide.
    pub fn height_gap(&self) -> u64 {
        self.hi.height.saturating_sub(self.lo.height)
    }
}

/// Final bracket of a search in heights.
///
/// `lo == hi` when the target equals the timestamp of that height. Otherwise
/// `lo` is the last height before the target and `hi` the first one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub lo: u64,
    pub hi: u64,
    /// Narrowing steps taken after seeding.
    pub iterations: u32,
}

impl SearchOutcome {
    pub fn is_exact(&self) -> bool {
        self.lo == self.hi
    }
}

/// Inclusive range of block heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRangeResult {
    pub start_height: u64,
    pub end_height: u64,
}

/// First adjacent pair, by timestamp, whose timestamps enclose `timestamp`.
pub fn find_bracket(timestamp: i64, points: &[ChainSample]) -> Option<Bracket> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| (p.timestamp, p.height));
    sorted.dedup();
    sorted
        .windows(2)
        .map(|pair| Bracket::new(pair[0], pair[1]))
        .find(|bracket| bracket.contains(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_bracket() {
        let points = [
            ChainSample::new(20, 1020),
            ChainSample::new(0, 1000),
            ChainSample::new(10, 1010),
        ];

        assert_eq!(
            find_bracket(1005, &points),
            Some(Bracket::new(points[1], points[2]))
        );
        assert_eq!(
            find_bracket(1010, &points),
            Some(Bracket::new(points[1], points[2]))
        );
        assert_eq!(
            find_bracket(1015, &points),
            Some(Bracket::new(points[2], points[0]))
        );
        assert!(find_bracket(999, &points).is_none());
        assert!(find_bracket(1021, &points).is_none());
    }

    #[test]
    fn test_find_bracket_ignores_duplicates() {
        let p = ChainSample::new(3, 30);
        let q = ChainSample::new(4, 40);
        assert_eq!(find_bracket(35, &[p, p, q, q]), Some(Bracket::new(p, q)));
        assert!(find_bracket(30, &[p]).is_none());
    }

    #[test]
    fn test_bracket_gap() {
        let bracket = Bracket::new(ChainSample::new(5, 1), ChainSample::new(9, 2));
        assert_eq!(bracket.height_gap(), 4);
        assert!(bracket.contains(1));
        assert!(!bracket.contains(3));
    }
}
