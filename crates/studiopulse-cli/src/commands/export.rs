//! `studiopulse export`: write a report file.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, SystemTime};

use studiopulse_core::LogSink;

use super::GlobalOpts;

pub fn run(opts: &GlobalOpts<'_>, output: &str, after: Duration) {
    super::init_logging("warn");
    let mut dashboard = super::make_dashboard(opts);
    let mut sink = LogSink::new();

    let running = AtomicBool::new(true);
    super::simulate::fast_forward(
        &mut dashboard,
        &mut sink,
        after,
        Duration::from_secs(1),
        &running,
    );

    match dashboard.export_report(Path::new(output), SystemTime::now()) {
        Ok(path) => {
            let snap = dashboard.snapshot();
            println!("Report written to {}", path.display());
            println!("  downloads: {}  ROI: {}%", snap.total, snap.ratio);
        }
        Err(e) => {
            eprintln!("Error exporting report: {e}");
            std::process::exit(1);
        }
    }
}
