//! Metric store: the one piece of mutable state on the dashboard.
//!
//! Downloads are split across platform channels. Every delta goes through
//! [`MetricStore::partition`] first, so the channel counts always add up to
//! the total: weighted channels take `floor(delta * weight)` and the last
//! (catch-all) channel takes whatever is left.

use serde::Serialize;

use crate::config::{SeedConfig, WeekPoint};

/// A platform channel and its running count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub name: String,
    #[serde(skip)]
    pub weight: Option<f64>,
    pub count: u64,
}

/// A delta split across channels. Only [`MetricStore::partition`] builds one,
/// so the shares always sum to `total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    total: u64,
    shares: Vec<u64>,
}

impl Partition {
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Per-channel increments in channel order.
    pub fn shares(&self) -> &[u64] {
        &self.shares
    }
}

/// Immutable point-in-time copy of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub total: u64,
    pub channels: Vec<Channel>,
    pub derived_value: f64,
    pub ratio: i64,
    pub ratio_bounds: (i64, i64),
    pub countries: u32,
    pub timeline: Vec<WeekPoint>,
    /// Number of deltas applied since start.
    pub updates: u64,
}

impl Snapshot {
    pub fn channel_counts(&self) -> Vec<u64> {
        self.channels.iter().map(|c| c.count).collect()
    }
}

/// Current simulated values.
#[derive(Debug, Clone)]
pub struct MetricStore {
    total: u64,
    channels: Vec<Channel>,
    derived_value: f64,
    unit_rate: f64,
    ratio: i64,
    ratio_min: i64,
    ratio_max: i64,
    countries: u32,
    timeline: Vec<WeekPoint>,
    updates: u64,
}

impl MetricStore {
    /// Build a store from seed data. The seed is expected to have passed
    /// [`DashboardConfig::validate`](crate::DashboardConfig::validate).
    pub fn new(seed: &SeedConfig, ratio_min: i64, ratio_max: i64) -> Self {
        Self {
            total: seed.total,
            channels: seed
                .channels
                .iter()
                .map(|c| Channel {
                    name: c.name.clone(),
                    weight: c.weight,
                    count: c.count,
                })
                .collect(),
            derived_value: seed.revenue,
            unit_rate: seed.unit_rate,
            ratio: seed.roi.clamp(ratio_min, ratio_max),
            ratio_min,
            ratio_max,
            countries: seed.countries,
            timeline: seed.timeline.clone(),
            updates: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn derived_value(&self) -> f64 {
        self.derived_value
    }

    pub fn ratio(&self) -> i64 {
        self.ratio
    }

    pub fn countries(&self) -> u32 {
        self.countries
    }

    pub fn unit_rate(&self) -> f64 {
        self.unit_rate
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn timeline(&self) -> &[WeekPoint] {
        &self.timeline
    }

    /// Split `delta` across channels by the fixed weight table.
    ///
    /// Each weighted channel gets `floor(delta * weight)`, capped at what is
    /// still unallocated; the catch-all gets the remainder and never goes
    /// negative even if the weights overshoot.
    pub fn partition(&self, delta: u64) -> Partition {
        let mut remaining = delta;
        let mut shares = Vec::with_capacity(self.channels.len());
        let Some((_, weighted)) = self.channels.split_last() else {
            return Partition {
                total: 0,
                shares,
            };
        };
        for ch in weighted {
            let raw = (delta as f64 * ch.weight.unwrap_or(0.0)).floor() as u64;
            let share = raw.min(remaining);
            remaining -= share;
            shares.push(share);
        }
        shares.push(remaining);
        Partition {
            total: delta,
            shares,
        }
    }

    /// Add a partitioned delta to the total, the channels and the derived value.
    pub fn apply_delta(&mut self, delta: &Partition) {
        debug_assert_eq!(delta.shares.len(), self.channels.len());
        self.total = self.total.saturating_add(delta.total);
        for (ch, share) in self.channels.iter_mut().zip(&delta.shares) {
            ch.count = ch.count.saturating_add(*share);
        }
        self.derived_value += delta.total as f64 * self.unit_rate;
        self.updates += 1;
    }

    /// Move the ratio by `delta`, clamped to the configured bounds.
    /// Returns the change actually applied.
    pub fn adjust_ratio(&mut self, delta: i64) -> i64 {
        let before = self.ratio;
        self.ratio = before
            .saturating_add(delta)
            .clamp(self.ratio_min, self.ratio_max);
        self.ratio - before
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            total: self.total,
            channels: self.channels.clone(),
            derived_value: self.derived_value,
            ratio: self.ratio,
            ratio_bounds: (self.ratio_min, self.ratio_max),
            countries: self.countries,
            timeline: self.timeline.clone(),
            updates: self.updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelSeed, DashboardConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn default_store() -> MetricStore {
        let config = DashboardConfig::default();
        MetricStore::new(&config.seed, config.ratio.min, config.ratio.max)
    }

    fn channel_sum(store: &MetricStore) -> u64 {
        store.channels().iter().map(|c| c.count).sum()
    }

    #[test]
    fn test_partition_reference_split() {
        let store = default_store();
        let p = store.partition(343);
        assert_eq!(p.shares(), &[144, 102, 75, 22]);
        assert_eq!(p.shares().iter().sum::<u64>(), 343);
    }

    #[test]
    fn test_partition_zero_delta() {
        let store = default_store();
        let p = store.partition(0);
        assert_eq!(p.shares(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_partition_always_sums_exactly() {
        let store = default_store();
        for delta in 0..5_000 {
            let p = store.partition(delta);
            assert_eq!(p.shares().iter().sum::<u64>(), delta, "delta {delta}");
        }
    }

    #[test]
    fn test_partition_overweight_table_never_underflows() {
        let seed = SeedConfig {
            total: 0,
            channels: vec![
                ChannelSeed {
                    name: "a".into(),
                    weight: Some(0.7),
                    count: 0,
                },
                ChannelSeed {
                    name: "b".into(),
                    weight: Some(0.7),
                    count: 0,
                },
                ChannelSeed {
                    name: "rest".into(),
                    weight: None,
                    count: 0,
                },
            ],
            ..SeedConfig::default()
        };
        let store = MetricStore::new(&seed, 0, 100);
        let p = store.partition(10);
        assert_eq!(p.shares(), &[7, 3, 0]);
    }

    #[test]
    fn test_apply_delta_keeps_sum_invariant() {
        let mut store = default_store();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let delta = rng.random_range(100..600);
            let before = store.total();
            let p = store.partition(delta);
            store.apply_delta(&p);
            assert_eq!(store.total(), before + delta);
            assert_eq!(channel_sum(&store), store.total());
        }
    }

    #[test]
    fn test_apply_delta_updates_derived_value() {
        let mut store = default_store();
        let before = store.derived_value();
        let p = store.partition(100);
        store.apply_delta(&p);
        assert!((store.derived_value() - before - 288.0).abs() < 1e-6);
    }

    #[test]
    fn test_channels_are_monotonic() {
        let mut store = default_store();
        let mut prev: Vec<u64> = store.channels().iter().map(|c| c.count).collect();
        for delta in [1, 2, 3, 50, 599, 70_000] {
            let p = store.partition(delta);
            store.apply_delta(&p);
            let now: Vec<u64> = store.channels().iter().map(|c| c.count).collect();
            assert!(now.iter().zip(&prev).all(|(a, b)| a >= b));
            prev = now;
        }
    }

    #[test]
    fn test_adjust_ratio_clamps() {
        let mut store = default_store();
        assert_eq!(store.ratio(), 164);
        assert_eq!(store.adjust_ratio(1_000), 36);
        assert_eq!(store.ratio(), 200);
        assert_eq!(store.adjust_ratio(i64::MIN), -50);
        assert_eq!(store.ratio(), 150);
        assert_eq!(store.adjust_ratio(i64::MAX), 50);
        assert_eq!(store.ratio(), 200);
    }

    #[test]
    fn test_ratio_random_walk_stays_in_bounds() {
        let seed = SeedConfig::default();
        let mut store = MetricStore::new(&seed, 150, 220);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            store.adjust_ratio(rng.random_range(-4..=4));
            assert!((150..=220).contains(&store.ratio()));
        }
    }

    #[test]
    fn test_seed_ratio_is_clamped() {
        let seed = SeedConfig {
            roi: 500,
            ..SeedConfig::default()
        };
        let store = MetricStore::new(&seed, 150, 200);
        assert_eq!(store.ratio(), 200);
    }

    #[test]
    fn test_snapshot_is_stable_without_mutation() {
        let store = default_store();
        assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = default_store();
        let before = store.snapshot();
        let p = store.partition(343);
        store.apply_delta(&p);
        assert_ne!(before, store.snapshot());
        assert_eq!(before.total, 2_847_392);
        assert_eq!(store.snapshot().updates, 1);
    }
}
