//! # studiopulse-core
//!
//! **A launch-day analytics wall that never sits still.**
//!
//! `studiopulse-core` is the engine behind the studio dashboard: it seeds a
//! metric store with launch numbers, animates the headline counters up from
//! zero, and keeps the figures drifting on timers: a steady download trickle,
//! a bounded ROI walk, and the occasional viral spike, each announced with a
//! toast.
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//! use studiopulse_core::{Dashboard, DashboardConfig, ElementId, MemorySink};
//!
//! let mut dash = Dashboard::seeded(DashboardConfig::default(), 42).unwrap();
//! let mut sink = MemorySink::new();
//!
//! dash.start(Duration::ZERO, &mut sink);
//! dash.pump(Duration::from_secs(90), &mut sink);
//!
//! let snap = dash.snapshot();
//! assert_eq!(snap.channel_counts().iter().sum::<u64>(), snap.total);
//! assert!(sink.text(ElementId::TotalDownloads).is_some());
//! ```
//!
//! ## Architecture
//!
//! Scheduler → Dashboard (jobs) → MetricStore → PresentationSink + toasts
//!
//! The dashboard runs on a caller-supplied monotonic clock. Nothing here
//! spawns threads or sleeps: the TUI, the HTTP server and the headless
//! simulator each drive [`Dashboard::pump`] from their own loop, which makes
//! every run reproducible from an RNG seed.

pub mod config;
pub mod countdown;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod interpolate;
pub mod notify;
pub mod scheduler;
pub mod sink;
pub mod store;
pub mod updater;

pub use config::{
    ChannelSeed, CountdownConfig, CounterConfig, DashboardConfig, RatioConfig, ReportMetadata,
    SeedConfig, SpecialConfig, SteadyConfig, WeekPoint,
};
pub use countdown::{Countdown, Phase};
pub use dashboard::{Dashboard, DashboardStats, Job};
pub use error::{Error, Result};
pub use export::{Report, ReportAnalysis, ReportSummary, format_iso8601};
pub use interpolate::{CounterAnimation, CounterFormat, Interpolator, group_thousands};
pub use notify::{DEFAULT_TOAST, NotificationQueue, Toast, ToastKind, ToastSlot};
pub use scheduler::{Fired, Scheduler, TaskHandle};
pub use sink::{ChartId, ElementId, LogSink, MemorySink, PresentationSink};
pub use store::{Channel, MetricStore, Partition, Snapshot};
pub use updater::{Notice, StochasticUpdater, SteadyMessage, UpdateOutcome};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
