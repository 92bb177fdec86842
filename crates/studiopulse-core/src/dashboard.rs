//! The dashboard: store, updater, timers, toasts and countdown in one place.
//!
//! A [`Dashboard`] is driven by a single loop that calls [`Dashboard::pump`]
//! with the time elapsed since start. Every job runs to completion inside
//! `pump`, and manual actions take `&mut self`, so the store never sees two
//! writers at once.
//!
//! ```
//! use std::time::Duration;
//! use studiopulse_core::{Dashboard, DashboardConfig, ElementId, MemorySink};
//!
//! let mut dash = Dashboard::seeded(DashboardConfig::default(), 7).unwrap();
//! let mut sink = MemorySink::new();
//! dash.start(Duration::ZERO, &mut sink);
//! dash.pump(Duration::from_secs(3), &mut sink);
//! assert_eq!(sink.text(ElementId::TotalDownloads), Some("2.847.392"));
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::countdown::{Countdown, Phase};
use crate::error::Result;
use crate::export::Report;
use crate::interpolate::{CounterAnimation, CounterFormat, Interpolator};
use crate::notify::{DEFAULT_TOAST, NotificationQueue, Toast, ToastKind, ToastSlot};
use crate::scheduler::{Fired, Scheduler, TaskHandle};
use crate::sink::{ChartId, ElementId, PresentationSink};
use crate::store::{MetricStore, Snapshot};
use crate::updater::{StochasticUpdater, UpdateOutcome};

/// Work items the scheduler hands back to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    CounterFrame,
    SteadyUpdate,
    RatioDrift,
    SpecialRoll,
    CountdownTick,
    /// Start-up toasts, shown one after another.
    IntroToast(usize),
}

const INTRO_TOASTS: [(u64, &str, ToastKind); 2] = [
    (
        1,
        "🎯 Data loaded! Real-time monitoring is live.",
        ToastKind::Success,
    ),
    (
        3,
        "📊 Highlight: ahead of the competition on polish and execution!",
        ToastKind::Info,
    ),
];

/// Running totals of what the dashboard has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub steady_updates: u64,
    pub ratio_moves: u64,
    pub special_events: u64,
    pub counter_frames: u64,
    /// Refreshes dropped because the target was missing.
    pub skipped_refreshes: u64,
}

pub struct Dashboard<R = StdRng> {
    config: DashboardConfig,
    store: MetricStore,
    updater: StochasticUpdater<R>,
    scheduler: Scheduler<Job>,
    toasts: ToastSlot,
    counters: Vec<CounterAnimation>,
    counter_task: Option<TaskHandle>,
    countdown: Countdown,
    now: Duration,
    started: bool,
    stats: DashboardStats,
}

impl Dashboard<StdRng> {
    /// Dashboard with a reproducible RNG.
    pub fn seeded(config: DashboardConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Dashboard seeded from the OS.
    pub fn from_os_rng(config: DashboardConfig) -> Result<Self> {
        Self::new(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> Dashboard<R> {
    pub fn new(config: DashboardConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let store = MetricStore::new(&config.seed, config.ratio.min, config.ratio.max);
        let updater = StochasticUpdater::new(&config, rng);
        let countdown = Countdown::new(config.countdown.clone());
        Ok(Self {
            config,
            store,
            updater,
            scheduler: Scheduler::new(),
            toasts: ToastSlot::new(),
            counters: Vec::new(),
            counter_task: None,
            countdown,
            now: Duration::ZERO,
            started: false,
            stats: DashboardStats::default(),
        })
    }

    // --- Lifecycle ---

    /// Schedule every job, start the counter animation and draw the first frame.
    /// Calling `start` again restarts the timers; the store keeps its values.
    pub fn start(&mut self, now: Duration, sink: &mut dyn PresentationSink) {
        self.stop();
        self.now = now;
        self.toasts.advance_to(now);

        let tick = self.config.counter.tick();
        let duration = self.config.counter.duration();
        self.counters = vec![
            CounterAnimation::new(
                ElementId::TotalDownloads,
                CounterFormat::Number,
                Interpolator::new(self.store.total() as f64, duration, tick),
            ),
            CounterAnimation::new(
                ElementId::TotalRevenue,
                CounterFormat::Currency,
                Interpolator::new(self.store.derived_value(), duration, tick),
            ),
        ];
        self.counter_task = Some(self.scheduler.every(now, tick, Job::CounterFrame));

        self.scheduler
            .every(now, self.config.steady.period(), Job::SteadyUpdate);
        self.scheduler
            .every(now, self.config.ratio.period(), Job::RatioDrift);
        self.scheduler
            .every(now, self.config.special.period(), Job::SpecialRoll);
        for (i, (delay, _, _)) in INTRO_TOASTS.iter().enumerate() {
            self.scheduler
                .after(now, Duration::from_secs(*delay), Job::IntroToast(i));
        }

        self.refresh_text(sink, ElementId::Roi, CounterFormat::Percent.format(self.store.ratio() as f64));
        self.refresh_text(sink, ElementId::Countries, self.store.countries().to_string());
        self.refresh_text(sink, ElementId::Countdown, self.countdown.display());
        self.refresh_platforms(sink);
        let (weekly, revenue): (Vec<f64>, Vec<f64>) = self
            .store
            .timeline()
            .iter()
            .map(|w| (w.downloads as f64, w.revenue))
            .unzip();
        self.refresh_chart(sink, ChartId::Timeline, &weekly);
        self.refresh_chart(sink, ChartId::TimelineRevenue, &revenue);

        self.started = true;
        log::info!(
            "dashboard started: {} downloads, {} channels",
            self.store.total(),
            self.store.channels().len()
        );
        self.toasts.enqueue(
            "Dashboard loaded! Data updating in real time.".to_string(),
            ToastKind::Success,
            DEFAULT_TOAST,
        );
    }

    /// Cancel every timer, including a running countdown. An unfinished
    /// intro animation is dropped, so later updates write exact values.
    pub fn stop(&mut self) {
        self.countdown.reset(&mut self.scheduler);
        self.scheduler.clear();
        self.counters.clear();
        self.counter_task = None;
        self.started = false;
    }

    /// Run every job due at or before `now`. Returns how many ran.
    ///
    /// Jobs replayed after a late pump see the toast clock at their own due
    /// time, so toast expiry does not depend on how often `pump` is called.
    pub fn pump(&mut self, now: Duration, sink: &mut dyn PresentationSink) -> usize {
        self.now = self.now.max(now);
        let mut ran = 0;
        while let Some(Fired { handle, at, job }) = self.scheduler.pop_due(self.now) {
            self.toasts.advance_to(at);
            self.run_job(handle, job, sink);
            ran += 1;
        }
        self.toasts.advance_to(self.now);
        ran
    }

    fn run_job(&mut self, handle: TaskHandle, job: Job, sink: &mut dyn PresentationSink) {
        match job {
            Job::CounterFrame => self.counter_frame(sink),
            Job::SteadyUpdate => {
                let outcome = self.updater.steady_update(&mut self.store);
                self.stats.steady_updates += 1;
                self.after_update(outcome, sink);
            }
            Job::RatioDrift => {
                if self.updater.drift_ratio(&mut self.store) != 0 {
                    self.stats.ratio_moves += 1;
                }
                let text = CounterFormat::Percent.format(self.store.ratio() as f64);
                self.refresh_text(sink, ElementId::Roi, text);
            }
            Job::SpecialRoll => {
                if let Some(outcome) = self.updater.roll_special(&mut self.store) {
                    self.stats.special_events += 1;
                    self.after_update(outcome, sink);
                }
            }
            Job::CountdownTick => {
                if self.countdown.handle() != Some(handle) {
                    log::debug!("dropping tick from a stopped countdown");
                    return;
                }
                let change = self.countdown.tick(&mut self.scheduler);
                self.refresh_text(sink, ElementId::Countdown, self.countdown.display());
                if let Some(phase) = change {
                    self.announce_phase(phase);
                }
            }
            Job::IntroToast(i) => {
                if let Some((_, message, kind)) = INTRO_TOASTS.get(i) {
                    self.toasts.enqueue(message.to_string(), *kind, DEFAULT_TOAST);
                }
            }
        }
    }

    fn counter_frame(&mut self, sink: &mut dyn PresentationSink) {
        let mut running = false;
        for counter in &mut self.counters {
            if counter.is_finished() {
                continue;
            }
            running |= counter.step(sink);
            self.stats.counter_frames += 1;
        }
        if !running && let Some(handle) = self.counter_task.take() {
            self.scheduler.cancel(handle);
            log::debug!("counter animation finished");
        }
    }

    fn after_update(&mut self, outcome: UpdateOutcome, sink: &mut dyn PresentationSink) {
        self.refresh_counter(sink, ElementId::TotalDownloads, self.store.total() as f64);
        self.refresh_counter(sink, ElementId::TotalRevenue, self.store.derived_value());
        self.refresh_platforms(sink);
        if let Some(notice) = outcome.notice {
            self.toasts.enqueue(notice.message, notice.kind, notice.duration);
        }
    }

    // --- Manual actions ---

    /// Fire a special event now, bypassing the probability roll.
    pub fn trigger_special_event(&mut self, sink: &mut dyn PresentationSink) -> UpdateOutcome {
        let outcome = self.updater.special_event(&mut self.store);
        self.stats.special_events += 1;
        self.after_update(outcome.clone(), sink);
        outcome
    }

    /// Start (or restart) the countdown from its full duration.
    pub fn start_countdown(&mut self, sink: &mut dyn PresentationSink) {
        let phase = self
            .countdown
            .start(&mut self.scheduler, self.now, Job::CountdownTick);
        self.refresh_text(sink, ElementId::Countdown, self.countdown.display());
        self.announce_phase(phase);
    }

    /// Stop the countdown and show its full duration again.
    pub fn reset_countdown(&mut self, sink: &mut dyn PresentationSink) {
        self.countdown.reset(&mut self.scheduler);
        self.refresh_text(sink, ElementId::Countdown, self.countdown.display());
    }

    /// Build a report from the current state.
    pub fn report(&self, generated_at: SystemTime) -> Report {
        Report::new(&self.store.snapshot(), &self.config.report, generated_at)
    }

    /// Export a report into `dir`. Success and failure both end in a toast;
    /// a failure leaves no file behind.
    pub fn export_report(&mut self, dir: &Path, generated_at: SystemTime) -> Result<PathBuf> {
        match self.report(generated_at).write_to(dir) {
            Ok(path) => {
                self.toasts.enqueue(
                    format!("Report exported: {}", path.display()),
                    ToastKind::Success,
                    DEFAULT_TOAST,
                );
                Ok(path)
            }
            Err(e) => {
                log::error!("report export failed: {e}");
                self.toasts.enqueue(
                    "Report export failed. Please try again.".to_string(),
                    ToastKind::Error,
                    DEFAULT_TOAST,
                );
                Err(e)
            }
        }
    }

    // --- Accessors ---

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toasts.visible()
    }

    pub fn toasts_shown(&self) -> u64 {
        self.toasts.shown()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_animating(&self) -> bool {
        self.counter_task.is_some()
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    /// Live scheduler tasks.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    // --- Refresh helpers ---

    fn announce_phase(&mut self, phase: Phase) {
        if let Some((message, kind)) = phase.notice() {
            self.toasts.enqueue(message.to_string(), kind, DEFAULT_TOAST);
        }
    }

    /// Write an exact counter value, or let a running intro animation carry
    /// it there.
    fn refresh_counter(&mut self, sink: &mut dyn PresentationSink, element: ElementId, value: f64) {
        if let Some(anim) = self
            .counters
            .iter_mut()
            .find(|c| c.element() == element && !c.is_finished())
        {
            anim.raise_target(value);
            return;
        }
        let format = match element {
            ElementId::TotalRevenue => CounterFormat::Currency,
            ElementId::Roi => CounterFormat::Percent,
            _ => CounterFormat::Number,
        };
        self.refresh_text(sink, element, format.format(value));
    }

    fn refresh_platforms(&mut self, sink: &mut dyn PresentationSink) {
        let counts: Vec<f64> = self
            .store
            .channels()
            .iter()
            .map(|c| c.count as f64)
            .collect();
        self.refresh_chart(sink, ChartId::Platforms, &counts);
    }

    fn refresh_text(&mut self, sink: &mut dyn PresentationSink, element: ElementId, text: String) {
        if let Err(e) = sink.set_text(element, &text) {
            self.stats.skipped_refreshes += 1;
            log::warn!("refresh skipped: {e}");
        }
    }

    fn refresh_chart(&mut self, sink: &mut dyn PresentationSink, chart: ChartId, values: &[f64]) {
        if let Err(e) = sink.update_chart_series(chart, values) {
            self.stats.skipped_refreshes += 1;
            log::warn!("refresh skipped: {e}");
        }
    }
}
