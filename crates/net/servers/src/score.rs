//! Score adjustment and response-time averaging.
//!
//! These are the per-record update rules; [`ServerCache`](crate::ServerCache)
//! applies them under its lock.

use crate::config::{DecayConfig, ServerCacheConfig};
use crate::record::{RESPONSE_TIME_MAX, ServerRecord};

impl ServerRecord {
    /// Add `delta` (may be negative), saturating at the configured bounds.
    pub fn add_score(&mut self, delta: i32, config: &ServerCacheConfig) {
        self.score = config.clamp_score(i64::from(self.score) + i64::from(delta));
    }

    /// Fold one latency observation into the moving average.
    ///
    /// The first sample is taken as is. Afterwards every `sample_period`-th
    /// sample weighs the observation `recent_weight` times the old value, and
    /// all others take the plain mean of the two. The result is capped at
    /// [`RESPONSE_TIME_MAX`] so a measured server never reads back as unmeasured.
    pub fn record_response_time(&mut self, millis: u64, decay: &DecayConfig) {
        self.sample_count = self.sample_count.saturating_add(1);
        let next = next_response_time(self.response_time, millis, self.sample_count, decay);
        self.response_time = Some(next.min(RESPONSE_TIME_MAX));
    }
}

pub(crate) fn next_response_time(
    previous: Option<u64>,
    observed: u64,
    sample_count: u32,
    decay: &DecayConfig,
) -> u64 {
    let Some(old) = previous else {
        return observed;
    };

    if decay.sample_period > 0 && sample_count % decay.sample_period == 0 {
        let weight = decay.recent_weight;
        old.saturating_add(observed.saturating_mul(weight)) / weight.saturating_add(1)
    } else {
        old.saturating_add(observed) / 2
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_add_score_clamps() {
        let config = ServerCacheConfig::default();
        let mut record = ServerRecord::new("tcp://a");

        record.add_score(10, &config);
        assert_eq!(record.score, 10);

        record.add_score(-5, &config);
        assert_eq!(record.score, 5);

        record.add_score(1_000, &config);
        assert_eq!(record.score, config.max_score);

        record.add_score(i32::MIN, &config);
        assert_eq!(record.score, config.min_score);
    }

    #[test]
    fn test_first_sample_is_exact() {
        let decay = DecayConfig::default();
        let mut record = ServerRecord::new("tcp://a");

        record.record_response_time(321, &decay);
        assert_eq!(record.response_time, Some(321));
        assert_eq!(record.sample_count, 1);
    }

    #[test]
    fn test_light_smoothing() {
        let decay = DecayConfig::default();
        let mut record = ServerRecord::new("tcp://a");

        record.record_response_time(100, &decay);
        record.record_response_time(200, &decay);
        assert_eq!(record.response_time, Some(150));

        record.record_response_time(51, &decay);
        assert_eq!(record.response_time, Some(100));
    }

    #[test]
    fn test_every_tenth_sample_reanchors() {
        let decay = DecayConfig::default();
        let mut record = ServerRecord::new("tcp://a");

        for _ in 0..9 {
            record.record_response_time(100, &decay);
        }
        assert_eq!(record.response_time, Some(100));

        // 10th: (100 + 4 * 600) / 5
        record.record_response_time(600, &decay);
        assert_eq!(record.sample_count, 10);
        assert_eq!(record.response_time, Some(500));

        // 11th: back to the plain mean
        record.record_response_time(100, &decay);
        assert_eq!(record.response_time, Some(300));

        for _ in 12..20 {
            record.record_response_time(300, &decay);
        }
        assert_eq!(record.response_time, Some(300));

        // 20th
        record.record_response_time(50, &decay);
        assert_eq!(record.response_time, Some(100));
    }

    #[test]
    fn test_reanchor_skipped_when_first_sample_falls_on_period() {
        let decay = DecayConfig::default();
        let mut record = ServerRecord::new("tcp://a");
        record.sample_count = 9;

        record.record_response_time(77, &decay);
        assert_eq!(record.response_time, Some(77));
    }

    #[test]
    fn test_response_time_capped_below_sentinel() {
        let decay = DecayConfig::default();
        let mut record = ServerRecord::new("tcp://a");

        record.record_response_time(u64::MAX, &decay);
        assert_eq!(record.response_time, Some(RESPONSE_TIME_MAX));

        record.record_response_time(u64::MAX, &decay);
        assert_eq!(record.response_time, Some(RESPONSE_TIME_MAX));
        assert!(!record.is_untested());
    }

    #[test]
    fn test_extreme_recent_weight() {
        let decay = DecayConfig {
            sample_period: 1,
            recent_weight: u64::MAX,
        };

        assert_eq!(next_response_time(Some(10), 20, 1, &decay), 1);
    }

    proptest! {
        #[test]
        fn prop_score_stays_in_bounds(deltas in proptest::collection::vec(any::<i32>(), 0..64)) {
            let config = ServerCacheConfig::default();
            let mut record = ServerRecord::new("tcp://a");
            for delta in deltas {
                record.add_score(delta, &config);
                prop_assert!(record.score >= config.min_score);
                prop_assert!(record.score <= config.max_score);
            }
        }

        #[test]
        fn prop_average_between_old_and_observed(old in 0u64..1_000_000, observed in 0u64..1_000_000, n in 1u32..100) {
            let decay = DecayConfig::default();
            let next = next_response_time(Some(old), observed, n, &decay);
            prop_assert!(next >= old.min(observed));
            prop_assert!(next <= old.max(observed));
        }
    }
}
