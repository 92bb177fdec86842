//! Counter interpolation for the intro animation.
//!
//! An [`Interpolator`] walks a value from `start` to `target` in equal steps,
//! one per tick, and snaps to the exact target on the last frame. It is a
//! plain iterator over frame values; [`CounterAnimation`] binds one to a
//! text element and a [`CounterFormat`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sink::{ElementId, PresentationSink};

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// How a counter value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterFormat {
    /// Floored integer with `.` thousands separators: `2.847.392`.
    #[default]
    Number,
    /// Millions of reais with one decimal: `R$ 8.2M`.
    Currency,
    /// Floored integer percentage: `164%`.
    Percent,
}

impl CounterFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Number => group_thousands(value.max(0.0).floor() as u64),
            Self::Currency => format!("R$ {:.1}M", value / 1_000_000.0),
            Self::Percent => format!("{}%", value.floor() as i64),
        }
    }
}

/// Format an integer with `.` between thousands groups.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Interpolator
// ---------------------------------------------------------------------------

/// Linear frame generator from `start` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolator {
    current: f64,
    target: f64,
    increment: f64,
    finished: bool,
}

impl Interpolator {
    /// Animate from zero to `target`.
    pub fn new(target: f64, duration: Duration, tick: Duration) -> Self {
        Self::from_start(0.0, target, duration, tick)
    }

    pub fn from_start(start: f64, target: f64, duration: Duration, tick: Duration) -> Self {
        let frames = if tick.is_zero() {
            1.0
        } else {
            (duration.as_secs_f64() / tick.as_secs_f64()).max(1.0)
        };
        Self {
            current: start,
            target,
            increment: (target - start) / frames,
            finished: false,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Raise the target of a running animation. Lower targets are ignored,
    /// the emitted sequence stays increasing.
    pub fn raise_target(&mut self, target: f64) {
        if !self.finished && target > self.target {
            self.target = target;
        }
    }
}

impl Iterator for Interpolator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.finished {
            return None;
        }
        let next = self.current + self.increment;
        // `next <= current` covers targets at or below start and increments
        // lost to float precision.
        if next >= self.target || next <= self.current {
            self.current = self.target;
            self.finished = true;
        } else {
            self.current = next;
        }
        Some(self.current)
    }
}

// ---------------------------------------------------------------------------
// CounterAnimation
// ---------------------------------------------------------------------------

/// An interpolator writing its frames into one text element.
#[derive(Debug, Clone)]
pub struct CounterAnimation {
    element: ElementId,
    format: CounterFormat,
    frames: Interpolator,
    last_text: Option<String>,
}

impl CounterAnimation {
    pub fn new(element: ElementId, format: CounterFormat, frames: Interpolator) -> Self {
        Self {
            element,
            format,
            frames,
            last_text: None,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_finished()
    }

    /// Text written by the most recent frame.
    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }

    pub fn raise_target(&mut self, target: f64) {
        self.frames.raise_target(target);
    }

    /// Advance one frame and write it. Returns `false` once the animation
    /// has emitted its final frame.
    pub fn step(&mut self, sink: &mut dyn PresentationSink) -> bool {
        let Some(value) = self.frames.next() else {
            return false;
        };
        let text = self.format.format(value);
        if let Err(e) = sink.set_text(self.element, &text) {
            log::warn!("counter frame skipped: {e}");
        }
        self.last_text = Some(text);
        !self.frames.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1.000");
        assert_eq!(group_thousands(2_847_392), "2.847.392");
        assert_eq!(group_thousands(100_000_000), "100.000.000");
    }

    #[test]
    fn test_counter_formats() {
        assert_eq!(CounterFormat::Number.format(2_847_391.9), "2.847.391");
        assert_eq!(CounterFormat::Currency.format(8_200_000.0), "R$ 8.2M");
        assert_eq!(CounterFormat::Percent.format(164.0), "164%");
        assert_eq!(CounterFormat::Number.format(-3.0), "0");
    }

    #[test]
    fn test_reference_animation() {
        let frames: Vec<f64> = Interpolator::new(2_847_392.0, ms(2_000), ms(16)).collect();
        assert!((125..=126).contains(&frames.len()), "{} frames", frames.len());
        assert_eq!(*frames.last().unwrap(), 2_847_392.0);
        assert!(frames.iter().all(|&v| v <= 2_847_392.0));
        assert!(frames.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(CounterFormat::Number.format(*frames.last().unwrap()), "2.847.392");
    }

    #[test]
    fn test_zero_target_terminates_on_first_tick() {
        let frames: Vec<f64> = Interpolator::new(0.0, ms(2_000), ms(16)).collect();
        assert_eq!(frames, vec![0.0]);
    }

    #[test]
    fn test_target_below_start_snaps() {
        let frames: Vec<f64> = Interpolator::from_start(10.0, 5.0, ms(100), ms(10)).collect();
        assert_eq!(frames, vec![5.0]);
    }

    #[test]
    fn test_duration_shorter_than_tick() {
        let frames: Vec<f64> = Interpolator::new(500.0, ms(5), ms(16)).collect();
        assert_eq!(frames, vec![500.0]);
    }

    #[test]
    fn test_zero_tick_is_single_frame() {
        let frames: Vec<f64> = Interpolator::new(42.0, ms(100), Duration::ZERO).collect();
        assert_eq!(frames, vec![42.0]);
    }

    #[test]
    fn test_precision_loss_still_terminates() {
        let start = 1e17;
        let frames: Vec<f64> =
            Interpolator::from_start(start, start + 10.0, ms(2_000), ms(16)).collect();
        assert!(!frames.is_empty());
        assert!(frames.len() <= 126);
        assert_eq!(*frames.last().unwrap(), start + 10.0);
    }

    #[test]
    fn test_many_shapes_are_monotone_and_exact() {
        for target in [1.0, 7.0, 1_000.0, 8_200_000.0, 123_456_789.0] {
            for (duration, tick) in [(2_000, 16), (1_000, 33), (500, 7), (16, 16)] {
                let frames: Vec<f64> =
                    Interpolator::new(target, ms(duration), ms(tick)).collect();
                assert_eq!(*frames.last().unwrap(), target);
                assert!(frames.windows(2).all(|w| w[0] <= w[1]));
                assert!(frames.len() as u64 <= duration / tick + 2);
            }
        }
    }

    #[test]
    fn test_finished_interpolator_stays_finished() {
        let mut it = Interpolator::new(10.0, ms(16), ms(16));
        assert_eq!(it.next(), Some(10.0));
        assert_eq!(it.next(), None);
        it.raise_target(20.0);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_raise_target_mid_animation() {
        let mut it = Interpolator::new(100.0, ms(100), ms(10));
        it.next();
        it.raise_target(150.0);
        it.raise_target(50.0);
        assert_eq!(it.target(), 150.0);
        let rest: Vec<f64> = it.collect();
        assert_eq!(*rest.last().unwrap(), 150.0);
    }

    #[test]
    fn test_counter_animation_writes_each_frame() {
        let mut sink = MemorySink::new();
        let mut anim = CounterAnimation::new(
            ElementId::TotalRevenue,
            CounterFormat::Currency,
            Interpolator::new(8_200_000.0, ms(160), ms(16)),
        );
        let mut steps = 0;
        while anim.step(&mut sink) {
            steps += 1;
        }
        assert_eq!(steps + 1, sink.writes());
        assert_eq!(sink.text(ElementId::TotalRevenue), Some("R$ 8.2M"));
        assert!(anim.is_finished());
        assert!(!anim.step(&mut sink));
    }

    #[test]
    fn test_counter_animation_missing_target_still_advances() {
        let mut sink = MemorySink::new().without_element(ElementId::TotalDownloads);
        let mut anim = CounterAnimation::new(
            ElementId::TotalDownloads,
            CounterFormat::Number,
            Interpolator::new(1_000.0, ms(32), ms(16)),
        );
        while anim.step(&mut sink) {}
        assert!(anim.is_finished());
        assert_eq!(anim.last_text(), Some("1.000"));
        assert_eq!(sink.writes(), 0);
    }
}
