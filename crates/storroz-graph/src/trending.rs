//! Trending hashtag aggregation.
//!
//! Each hashtag carries a fixed ring of per-hour counters covering a
//! 24-hour window. Recording a tag increments the current hour's
//! slot, reclaiming it first if it still holds a count from a
//! previous lap of the ring; stale slots are never swept, only
//! ignored on read and overwritten on write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storroz_core::HashtagId;

/// Number of ring slots, one per interval.
const WINDOW_SLOTS: usize = 24;

/// Seconds per interval.
const SLOT_SECONDS: i64 = 3600;

/// One hashtag's ranked trending result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingHashtag {
    pub hashtag: HashtagId,
    /// Tags recorded inside the live window.
    pub count: u64,
    /// Most recent tag time; breaks count ties, more recent first.
    pub last_tagged_at: DateTime<Utc>,
}

/// Per-hashtag counter ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CounterRing {
    /// Count per slot.
    counts: Vec<u32>,
    /// The interval index (epoch hour) each slot last counted for.
    /// A slot is live only if its interval falls inside the window
    /// ending at the query time.
    intervals: Vec<i64>,
    last_tagged_at: DateTime<Utc>,
}

impl CounterRing {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            counts: vec![0; WINDOW_SLOTS],
            intervals: vec![-1; WINDOW_SLOTS],
            last_tagged_at: at,
        }
    }

    fn record(&mut self, at: DateTime<Utc>) {
        let interval = at.timestamp().div_euclid(SLOT_SECONDS);
        let slot = interval.rem_euclid(WINDOW_SLOTS as i64) as usize;

        if self.intervals[slot] != interval {
            // The slot last counted a different lap of the ring.
            self.counts[slot] = 0;
            self.intervals[slot] = interval;
        }
        self.counts[slot] += 1;

        if at > self.last_tagged_at {
            self.last_tagged_at = at;
        }
    }

    /// Sums slots whose interval lies inside the window ending at
    /// `now`.
    fn live_sum(&self, now: DateTime<Utc>) -> u64 {
        let current = now.timestamp().div_euclid(SLOT_SECONDS);
        self.counts
            .iter()
            .zip(&self.intervals)
            .filter(|&(_, &interval)| {
                interval >= 0 && interval <= current && current - interval < WINDOW_SLOTS as i64
            })
            .map(|(&count, _)| count as u64)
            .sum()
    }
}

/// Maintains time-windowed usage counts per hashtag.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrendingAggregator {
    rings: HashMap<HashtagId, CounterRing>,
}

impl TrendingAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one tagging of `hashtag` at `at`.
    pub fn record(&mut self, hashtag: HashtagId, at: DateTime<Utc>) {
        self.rings
            .entry(hashtag)
            .or_insert_with(|| CounterRing::new(at))
            .record(at);
    }

    /// Top `k` hashtags by live-window count, descending.
    ///
    /// Ties break by most recent tag time, then ascending id for
    /// determinism. Hashtags with no live activity are omitted.
    pub fn trending(&self, k: usize, now: DateTime<Utc>) -> Vec<TrendingHashtag> {
        let mut ranked: Vec<TrendingHashtag> = self
            .rings
            .iter()
            .filter_map(|(&hashtag, ring)| {
                let count = ring.live_sum(now);
                (count > 0).then_some(TrendingHashtag {
                    hashtag,
                    count,
                    last_tagged_at: ring.last_tagged_at,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.last_tagged_at.cmp(&a.last_tagged_at))
                .then(a.hashtag.cmp(&b.hashtag))
        });
        ranked.truncate(k);
        ranked
    }

    /// Number of hashtags with any recorded activity, live or stale.
    pub fn tracked_count(&self) -> usize {
        self.rings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_inside_window() {
        let mut agg = TrendingAggregator::new();
        let tag = HashtagId(1);
        agg.record(tag, t0());
        agg.record(tag, t0() + Duration::minutes(30));
        agg.record(tag, t0() + Duration::hours(2));

        let now = t0() + Duration::hours(3);
        let ranked = agg.trending(10, now);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].count, 3);
    }

    #[test]
    fn test_stale_intervals_drop_out() {
        let mut agg = TrendingAggregator::new();
        let tag = HashtagId(1);
        agg.record(tag, t0());

        // Inside the window the count is visible.
        assert_eq!(agg.trending(10, t0() + Duration::hours(23))[0].count, 1);

        // A full window later it is not, without any sweep having run.
        assert!(agg.trending(10, t0() + Duration::hours(24)).is_empty());
    }

    #[test]
    fn test_slot_reclaim_on_ring_lap() {
        let mut agg = TrendingAggregator::new();
        let tag = HashtagId(1);
        agg.record(tag, t0());
        // Same slot, one lap of the ring later: old count must not
        // leak into the new interval.
        agg.record(tag, t0() + Duration::hours(24));

        let ranked = agg.trending(10, t0() + Duration::hours(24));
        assert_eq!(ranked[0].count, 1);
    }

    #[test]
    fn test_tie_breaks_by_recency() {
        let mut agg = TrendingAggregator::new();
        let (go, rust) = (HashtagId(1), HashtagId(2));

        for i in 0..3 {
            agg.record(go, t0() + Duration::minutes(i));
        }
        for i in 0..3 {
            agg.record(rust, t0() + Duration::minutes(10 + i));
        }

        let ranked = agg.trending(2, t0() + Duration::hours(1));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].hashtag, rust, "more recent activity wins the tie");
        assert_eq!(ranked[1].hashtag, go);
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].count, 3);
    }

    #[test]
    fn test_ranking_by_count_desc() {
        let mut agg = TrendingAggregator::new();
        agg.record(HashtagId(1), t0());
        for i in 0..5 {
            agg.record(HashtagId(2), t0() + Duration::minutes(i));
        }

        let ranked = agg.trending(1, t0() + Duration::hours(1));
        assert_eq!(ranked, vec![TrendingHashtag {
            hashtag: HashtagId(2),
            count: 5,
            last_tagged_at: t0() + Duration::minutes(4),
        }]);
    }

    #[test]
    fn test_k_truncates() {
        let mut agg = TrendingAggregator::new();
        for id in 1..=5 {
            agg.record(HashtagId(id), t0());
        }
        assert_eq!(agg.trending(3, t0()).len(), 3);
        assert_eq!(agg.trending(0, t0()).len(), 0);
    }
}
