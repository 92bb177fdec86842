//! Debate-prep countdown.
//!
//! Ticks once per second on the dashboard scheduler and moves through
//! `Running → Warning → Critical → Finished`. The countdown stores the handle
//! of its tick task and clears it on every stop path (reset, restart,
//! finish) so a cancelled countdown can never receive a late tick.

use std::time::Duration;

use serde::Serialize;

use crate::config::CountdownConfig;
use crate::notify::ToastKind;
use crate::scheduler::{Scheduler, TaskHandle};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Warning,
    Critical,
    Finished,
}

impl Phase {
    /// Toast announcing entry into this phase.
    pub fn notice(self) -> Option<(&'static str, ToastKind)> {
        match self {
            Self::Idle | Self::Running => None,
            Self::Warning => Some(("⏳ One minute left, wrap up the argument!", ToastKind::Info)),
            Self::Critical => Some(("⚠️ Final seconds!", ToastKind::Error)),
            Self::Finished => Some(("⚔️ Time's up! Debate on!", ToastKind::Battle)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Countdown {
    config: CountdownConfig,
    remaining_secs: u64,
    phase: Phase,
    handle: Option<TaskHandle>,
}

impl Countdown {
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            remaining_secs: config.duration_secs,
            config,
            phase: Phase::Idle,
            handle: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.remaining_secs)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<TaskHandle> {
        self.handle
    }

    /// `MM:SS` text for the countdown element.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Start from the full duration. A running countdown is restarted; its
    /// old tick task is cancelled first.
    pub fn start<J: Clone>(&mut self, scheduler: &mut Scheduler<J>, now: Duration, job: J) -> Phase {
        self.stop(scheduler);
        self.remaining_secs = self.config.duration_secs;
        self.phase = self.phase_for(self.remaining_secs);
        if self.phase != Phase::Finished {
            self.handle = Some(scheduler.every(now, TICK, job));
        }
        self.phase
    }

    /// Stop and return to the idle, full-duration state.
    pub fn reset<J: Clone>(&mut self, scheduler: &mut Scheduler<J>) {
        self.stop(scheduler);
        self.remaining_secs = self.config.duration_secs;
        self.phase = Phase::Idle;
    }

    /// Advance one second. Returns the new phase when it changed.
    pub fn tick<J: Clone>(&mut self, scheduler: &mut Scheduler<J>) -> Option<Phase> {
        if self.handle.is_none() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let next = self.phase_for(self.remaining_secs);
        if next == Phase::Finished {
            self.stop(scheduler);
        }
        if next != self.phase {
            self.phase = next;
            Some(next)
        } else {
            None
        }
    }

    fn stop<J: Clone>(&mut self, scheduler: &mut Scheduler<J>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    fn phase_for(&self, remaining: u64) -> Phase {
        if remaining == 0 {
            Phase::Finished
        } else if remaining <= self.config.critical_secs {
            Phase::Critical
        } else if remaining <= self.config.warning_secs {
            Phase::Warning
        } else {
            Phase::Running
        }
    }
}
