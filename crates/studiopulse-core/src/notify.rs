//! Toast notifications.
//!
//! Fire-and-forget: callers enqueue a message with a display duration and
//! move on. [`ToastSlot`] shows at most one toast; a new one replaces the
//! current one, and a toast disappears once its duration has elapsed on the
//! dashboard clock.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Visual style of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
    /// High-visibility style for special events and the countdown finish.
    Battle,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Battle => write!(f, "battle"),
        }
    }
}

/// Default display time when the caller has no preference.
pub const DEFAULT_TOAST: Duration = Duration::from_secs(3);

/// One visible notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    #[serde(serialize_with = "as_millis")]
    pub shown_at: Duration,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

impl Toast {
    pub fn expires_at(&self) -> Duration {
        self.shown_at + self.duration
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Consumer of toast messages.
pub trait NotificationQueue {
    fn enqueue(&mut self, message: String, kind: ToastKind, duration: Duration);
}

/// Single-slot toast holder driven by the dashboard clock.
#[derive(Debug, Clone, Default)]
pub struct ToastSlot {
    now: Duration,
    current: Option<Toast>,
    shown: u64,
}

impl ToastSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and dismiss an expired toast.
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
        if self
            .current
            .as_ref()
            .is_some_and(|t| t.expires_at() <= self.now)
        {
            self.current = None;
        }
    }

    /// The toast currently on screen, if any.
    pub fn visible(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    /// Time left before the visible toast is dismissed.
    pub fn remaining(&self) -> Option<Duration> {
        self.current
            .as_ref()
            .map(|t| t.expires_at().saturating_sub(self.now))
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Total toasts shown since start.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl NotificationQueue for ToastSlot {
    fn enqueue(&mut self, message: String, kind: ToastKind, duration: Duration) {
        log::info!("[{kind}] {message}");
        self.current = Some(Toast {
            message,
            kind,
            shown_at: self.now,
            duration,
        });
        self.shown += 1;
    }
}
