//! Dashboard configuration.
//!
//! Every section has a `Default` that reproduces the launch dashboard the
//! studio presented: 2.8M downloads across four platforms, a 30 s update
//! cadence, ROI drifting between 150% and 200%, and a rare viral spike.
//! A JSON file can override any subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// One platform channel in the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeed {
    pub name: String,
    /// Share of each delta. `None` marks the catch-all channel, which must be last.
    pub weight: Option<f64>,
    pub count: u64,
}

impl ChannelSeed {
    fn new(name: &str, weight: Option<f64>, count: u64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            count,
        }
    }
}

/// One point of the weekly timeline chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPoint {
    pub label: String,
    pub downloads: u64,
    pub revenue: f64,
}

/// Initial values loaded into the metric store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub total: u64,
    pub channels: Vec<ChannelSeed>,
    pub revenue: f64,
    /// Revenue per download.
    pub unit_rate: f64,
    pub countries: u32,
    pub roi: i64,
    pub timeline: Vec<WeekPoint>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let weeks: [(u64, f64); 8] = [
            (180_000, 520_000.0),
            (340_000, 980_000.0),
            (520_000, 1_500_000.0),
            (680_000, 1_960_000.0),
            (820_000, 2_360_000.0),
            (1_100_000, 3_170_000.0),
            (1_850_000, 5_330_000.0),
            (2_847_392, 8_200_000.0),
        ];
        Self {
            total: 2_847_392,
            channels: vec![
                ChannelSeed::new("Steam", Some(0.42), 1_200_000),
                ChannelSeed::new("PlayStation", Some(0.30), 847_000),
                ChannelSeed::new("Xbox", Some(0.22), 625_000),
                ChannelSeed::new("Mobile", None, 175_392),
            ],
            revenue: 8_200_000.0,
            unit_rate: 2.88,
            countries: 190,
            roi: 164,
            timeline: weeks
                .iter()
                .enumerate()
                .map(|(i, &(downloads, revenue))| WeekPoint {
                    label: format!("Week {}", i + 1),
                    downloads,
                    revenue,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Timer sections
// ---------------------------------------------------------------------------

/// The steady download trickle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyConfig {
    pub period_ms: u64,
    /// Smallest delta drawn per cycle.
    pub delta_low: u64,
    /// Deltas are drawn from `[delta_low, delta_low + delta_span)`.
    pub delta_span: u64,
    pub notify_probability: f64,
    pub toast_ms: u64,
}

impl Default for SteadyConfig {
    fn default() -> Self {
        Self {
            period_ms: 30_000,
            delta_low: 100,
            delta_span: 500,
            notify_probability: 0.3,
            toast_ms: 5_000,
        }
    }
}

/// ROI random walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioConfig {
    pub period_ms: u64,
    /// Each step moves by an integer in `[-step, +step]`.
    pub step: i64,
    pub min: i64,
    pub max: i64,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            period_ms: 45_000,
            step: 3,
            min: 150,
            max: 200,
        }
    }
}

/// The rare viral spike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialConfig {
    /// How often the dashboard rolls for a spike.
    pub period_ms: u64,
    pub probability: f64,
    pub delta_low: u64,
    pub delta_span: u64,
    pub toast_ms: u64,
}

impl Default for SpecialConfig {
    fn default() -> Self {
        Self {
            period_ms: 60_000,
            probability: 0.05,
            delta_low: 20_000,
            delta_span: 50_000,
            toast_ms: 8_000,
        }
    }
}

/// Intro counter animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub duration_ms: u64,
    pub tick_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2_000,
            tick_ms: 16,
        }
    }
}

/// Debate-prep countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub duration_secs: u64,
    pub warning_secs: u64,
    pub critical_secs: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            warning_secs: 60,
            critical_secs: 10,
        }
    }
}

/// Static text copied into every exported report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub studio: String,
    pub market_position: String,
    pub competitive_advantage: String,
    pub notes: Vec<String>,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            studio: "Shadow Games".to_string(),
            market_position: "Indie horror category leader".to_string(),
            competitive_advantage: "Multi-platform launch with strategic timing".to_string(),
            notes: vec![
                "Live technical demo during the pitch".to_string(),
                "Competitive analysis based on the right market".to_string(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Full dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub seed: SeedConfig,
    pub steady: SteadyConfig,
    pub ratio: RatioConfig,
    pub special: SpecialConfig,
    pub counter: CounterConfig,
    pub countdown: CountdownConfig,
    pub report: ReportMetadata,
}

impl DashboardConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would break store invariants or stall the timers.
    pub fn validate(&self) -> Result<()> {
        let seed = &self.seed;
        let Some((last, weighted)) = seed.channels.split_last() else {
            return Err(invalid("seed needs at least one channel"));
        };
        if last.weight.is_some() {
            return Err(invalid("last channel is the catch-all and must not carry a weight"));
        }
        let mut weight_sum = 0.0;
        for ch in weighted {
            match ch.weight {
                Some(w) if w.is_finite() && (0.0..=1.0).contains(&w) => weight_sum += w,
                Some(w) => {
                    return Err(invalid(format!("channel {} has weight {w}", ch.name)));
                }
                None => {
                    return Err(invalid(format!(
                        "channel {} has no weight but is not last",
                        ch.name
                    )));
                }
            }
        }
        if weight_sum > 1.0 {
            return Err(invalid(format!("channel weights sum to {weight_sum:.3} > 1")));
        }
        let channel_sum: u64 = seed.channels.iter().map(|c| c.count).sum();
        if channel_sum != seed.total {
            return Err(invalid(format!(
                "channel counts sum to {channel_sum}, total is {}",
                seed.total
            )));
        }
        if !seed.unit_rate.is_finite() || seed.unit_rate < 0.0 {
            return Err(invalid("unit_rate must be a non-negative number"));
        }

        let ratio = &self.ratio;
        if ratio.min > ratio.max {
            return Err(invalid(format!(
                "ratio bounds [{}, {}] are inverted",
                ratio.min, ratio.max
            )));
        }
        if ratio.step < 0 {
            return Err(invalid("ratio step must be non-negative"));
        }

        for (name, p) in [
            ("steady.notify_probability", self.steady.notify_probability),
            ("special.probability", self.special.probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        if self.steady.delta_span == 0 || self.special.delta_span == 0 {
            return Err(invalid("delta_span must be at least 1"));
        }
        let mut largest_delta = 0;
        for (name, low, span) in [
            ("steady", self.steady.delta_low, self.steady.delta_span),
            ("special", self.special.delta_low, self.special.delta_span),
        ] {
            let Some(high) = low.checked_add(span) else {
                return Err(invalid(format!(
                    "{name}.delta_low + {name}.delta_span overflows u64"
                )));
            };
            largest_delta = largest_delta.max(high);
        }
        if seed.total.checked_add(largest_delta).is_none() {
            return Err(invalid("seed total leaves no room for a single update"));
        }

        for (name, ms) in [
            ("steady.period_ms", self.steady.period_ms),
            ("ratio.period_ms", self.ratio.period_ms),
            ("special.period_ms", self.special.period_ms),
            ("counter.tick_ms", self.counter.tick_ms),
        ] {
            if ms == 0 {
                return Err(invalid(format!("{name} must be positive")));
            }
        }

        let cd = &self.countdown;
        if cd.critical_secs > cd.warning_secs || cd.warning_secs > cd.duration_secs {
            return Err(invalid("countdown thresholds must satisfy critical <= warning <= duration"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}

impl SteadyConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl RatioConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl SpecialConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl CounterConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        DashboardConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_seed_channels_sum_to_total() {
        let seed = SeedConfig::default();
        let sum: u64 = seed.channels.iter().map(|c| c.count).sum();
        assert_eq!(sum, seed.total);
        assert_eq!(seed.timeline.len(), 8);
        assert_eq!(seed.timeline.last().unwrap().downloads, seed.total);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"ratio": {"min": 100, "max": 300}}"#).unwrap();
        assert_eq!(config.ratio.min, 100);
        assert_eq!(config.ratio.max, 300);
        assert_eq!(config.ratio.step, 3);
        assert_eq!(config.steady, SteadyConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_weighted_catch_all() {
        let mut config = DashboardConfig::default();
        config.seed.channels.last_mut().unwrap().weight = Some(0.06);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_overweight_table() {
        let mut config = DashboardConfig::default();
        config.seed.channels[0].weight = Some(0.9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unbalanced_seed() {
        let mut config = DashboardConfig::default();
        config.seed.total += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ratio_bounds() {
        let mut config = DashboardConfig::default();
        config.ratio.min = 250;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut config = DashboardConfig::default();
        config.steady.period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = DashboardConfig::default();
        config.special.probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overflowing_delta_range() {
        let mut config = DashboardConfig::default();
        config.steady.delta_low = u64::MAX;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = DashboardConfig::default();
        config.special.delta_low = u64::MAX - 10;
        config.special.delta_span = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_total_without_headroom() {
        let mut config = DashboardConfig::default();
        let last = config.seed.channels.len() - 1;
        let bump = u64::MAX - config.seed.total;
        config.seed.channels[last].count += bump;
        config.seed.total = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no room"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = DashboardConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.json");
        std::fs::write(&path, r#"{"steady": {"period_ms": 1000}}"#).unwrap();
        let config = DashboardConfig::from_path(&path).unwrap();
        assert_eq!(config.steady.period(), Duration::from_secs(1));
    }
}
