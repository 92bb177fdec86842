//! `studiopulse simulate`: run the dashboard headless on a virtual clock.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use studiopulse_core::{CounterFormat, Dashboard, LogSink, group_thousands};

use super::GlobalOpts;

pub fn run(
    opts: &GlobalOpts<'_>,
    duration: Duration,
    step: Duration,
    output: Option<&str>,
    json: bool,
) {
    super::init_logging("info");
    let mut dashboard = super::make_dashboard(opts);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    let mut sink = LogSink::new();
    let reached = fast_forward(&mut dashboard, &mut sink, duration, step, &running);
    if reached < duration {
        eprintln!("Interrupted at {:.0}s of {:.0}s.", reached.as_secs_f64(), duration.as_secs_f64());
    }

    if json {
        match serde_json::to_string_pretty(&dashboard.snapshot()) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing snapshot: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print_summary(&dashboard, reached);
    }

    if let Some(dir) = output {
        match dashboard.export_report(Path::new(dir), SystemTime::now()) {
            Ok(path) => println!("Report written to {}", path.display()),
            Err(e) => {
                eprintln!("Error exporting report: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Start the dashboard and pump it in `step` increments until `duration`
/// or until `running` clears. Returns the virtual time reached.
pub fn fast_forward(
    dashboard: &mut Dashboard,
    sink: &mut LogSink,
    duration: Duration,
    step: Duration,
    running: &AtomicBool,
) -> Duration {
    let step = step.max(Duration::from_millis(1));
    dashboard.start(Duration::ZERO, sink);

    let mut now = Duration::ZERO;
    while now < duration && running.load(Ordering::SeqCst) {
        now = (now + step).min(duration);
        dashboard.pump(now, sink);
    }
    now
}

fn print_summary(dashboard: &Dashboard, elapsed: Duration) {
    let snap = dashboard.snapshot();
    let stats = dashboard.stats();

    println!("Simulated {:.0}s", elapsed.as_secs_f64());
    println!();
    println!("  Downloads:  {}", group_thousands(snap.total));
    println!("  Revenue:    {}", CounterFormat::Currency.format(snap.derived_value));
    println!("  ROI:        {}%", snap.ratio);
    println!("  Countries:  {}", snap.countries);
    println!();
    println!("  {:<14} {:>12} {:>7}", "Platform", "Downloads", "Share");
    for ch in &snap.channels {
        let share = if snap.total == 0 {
            0.0
        } else {
            ch.count as f64 / snap.total as f64 * 100.0
        };
        println!("  {:<14} {:>12} {:>6.1}%", ch.name, group_thousands(ch.count), share);
    }
    println!();
    println!(
        "  {} steady updates, {} ROI moves, {} viral spikes, {} toasts",
        stats.steady_updates,
        stats.ratio_moves,
        stats.special_events,
        dashboard.toasts_shown()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use studiopulse_core::DashboardConfig;

    #[test]
    fn fast_forward_reaches_duration() {
        let mut dash = Dashboard::seeded(DashboardConfig::default(), 1).unwrap();
        let mut sink = LogSink::new();
        let running = AtomicBool::new(true);
        let reached = fast_forward(
            &mut dash,
            &mut sink,
            Duration::from_secs(95),
            Duration::from_secs(10),
            &running,
        );
        assert_eq!(reached, Duration::from_secs(95));
        assert_eq!(dash.stats().steady_updates, 3);
    }

    #[test]
    fn fast_forward_stops_when_interrupted() {
        let mut dash = Dashboard::seeded(DashboardConfig::default(), 1).unwrap();
        let mut sink = LogSink::new();
        let running = AtomicBool::new(false);
        let reached = fast_forward(
            &mut dash,
            &mut sink,
            Duration::from_secs(3600),
            Duration::from_secs(1),
            &running,
        );
        assert_eq!(reached, Duration::ZERO);
        assert_eq!(dash.stats().steady_updates, 0);
    }
}
