//! Stochastic metric updates.
//!
//! Three independent jobs feed the store:
//! - the steady trickle: a uniform delta every period, split across channels,
//!   with an occasional toast picked from a fixed pool;
//! - the ratio drift: a bounded random walk on ROI;
//! - the special event: a rare, much larger delta that always announces itself.
//!
//! None of these can fail. They only draw from the RNG and do saturating
//! arithmetic on the store.

use std::time::Duration;

use rand::Rng;

use crate::config::{DashboardConfig, RatioConfig, SpecialConfig, SteadyConfig};
use crate::interpolate::group_thousands;
use crate::notify::ToastKind;
use crate::store::{MetricStore, Partition};

// ---------------------------------------------------------------------------
// Message pool
// ---------------------------------------------------------------------------

/// Messages the steady update may announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteadyMessage {
    NewDownloads,
    MarketExpansion,
    CategoryLead,
    RoiStatus,
}

impl SteadyMessage {
    pub const ALL: [SteadyMessage; 4] = [
        SteadyMessage::NewDownloads,
        SteadyMessage::MarketExpansion,
        SteadyMessage::CategoryLead,
        SteadyMessage::RoiStatus,
    ];

    pub fn render(self, delta: u64, period: Duration, store: &MetricStore) -> String {
        match self {
            Self::NewDownloads => format!(
                "📈 +{delta} new downloads in the last {}!",
                describe_period(period)
            ),
            Self::MarketExpansion => format!(
                "🌍 Expansion into a new market! Now in {} countries.",
                store.countries()
            ),
            Self::CategoryLead => "🏆 Holding #1 in the Horror category!".to_string(),
            Self::RoiStatus => format!(
                "💰 Current ROI: {}%, beating projections!",
                store.ratio()
            ),
        }
    }
}

fn describe_period(period: Duration) -> String {
    match (period.as_secs(), period.subsec_millis()) {
        (1, 0) => "second".to_string(),
        (secs, 0) => format!("{secs} seconds"),
        _ => format!("{:.1} seconds", period.as_secs_f64()),
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A toast the caller should enqueue.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

/// What one update did to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub partition: Partition,
    pub revenue_delta: f64,
    pub notice: Option<Notice>,
}

// ---------------------------------------------------------------------------
// StochasticUpdater
// ---------------------------------------------------------------------------

/// Draws randomized updates and applies them to a [`MetricStore`].
#[derive(Debug, Clone)]
pub struct StochasticUpdater<R> {
    steady: SteadyConfig,
    ratio: RatioConfig,
    special: SpecialConfig,
    rng: R,
}

impl<R: Rng> StochasticUpdater<R> {
    pub fn new(config: &DashboardConfig, rng: R) -> Self {
        Self {
            steady: config.steady.clone(),
            ratio: config.ratio.clone(),
            special: config.special.clone(),
            rng,
        }
    }

    /// One steady cycle: draw, partition, apply, maybe announce.
    pub fn steady_update(&mut self, store: &mut MetricStore) -> UpdateOutcome {
        let delta = draw_delta(&mut self.rng, self.steady.delta_low, self.steady.delta_span);
        let (partition, revenue_delta) = apply(store, delta);
        log::debug!(
            "steady update: +{delta} downloads {:?}, +{revenue_delta:.2} revenue",
            partition.shares()
        );

        let notice = if self.rng.random_bool(self.steady.notify_probability) {
            let idx = self.rng.random_range(0..SteadyMessage::ALL.len());
            let message = SteadyMessage::ALL[idx].render(delta, self.steady.period(), store);
            Some(Notice {
                message,
                kind: ToastKind::Success,
                duration: Duration::from_millis(self.steady.toast_ms),
            })
        } else {
            None
        };

        UpdateOutcome {
            partition,
            revenue_delta,
            notice,
        }
    }

    /// One ratio step in `[-step, +step]`, clamped by the store. Returns the
    /// change actually applied.
    pub fn drift_ratio(&mut self, store: &mut MetricStore) -> i64 {
        let step = self.ratio.step.max(0);
        let drawn = self.rng.random_range(-step..=step);
        let applied = store.adjust_ratio(drawn);
        log::debug!("ratio drift: drew {drawn:+}, applied {applied:+}, now {}%", store.ratio());
        applied
    }

    /// Roll for a special event; runs it with the configured probability.
    pub fn roll_special(&mut self, store: &mut MetricStore) -> Option<UpdateOutcome> {
        if self.rng.random_bool(self.special.probability) {
            Some(self.special_event(store))
        } else {
            None
        }
    }

    /// Run a special event unconditionally.
    pub fn special_event(&mut self, store: &mut MetricStore) -> UpdateOutcome {
        let delta = draw_delta(&mut self.rng, self.special.delta_low, self.special.delta_span);
        let (partition, revenue_delta) = apply(store, delta);
        log::info!("special event: +{delta} downloads");

        UpdateOutcome {
            partition,
            revenue_delta,
            notice: Some(Notice {
                message: format!(
                    "🚀 VIRAL! +{} downloads in one hour! Trending worldwide!",
                    group_thousands(delta)
                ),
                kind: ToastKind::Battle,
                duration: Duration::from_millis(self.special.toast_ms),
            }),
        }
    }
}

fn apply(store: &mut MetricStore, delta: u64) -> (Partition, f64) {
    let partition = store.partition(delta);
    store.apply_delta(&partition);
    (partition, delta as f64 * store.unit_rate())
}

/// Uniform draw from `[low, low + span)`, narrowed at `u64::MAX` instead of
/// going empty.
fn draw_delta<R: Rng>(rng: &mut R, low: u64, span: u64) -> u64 {
    let high = low.saturating_add(span.max(1) - 1);
    rng.random_range(low..=high)
}
