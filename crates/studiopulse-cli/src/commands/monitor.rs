use std::path::PathBuf;
use std::time::Duration;

use super::GlobalOpts;

pub fn run(opts: &GlobalOpts<'_>, refresh_ms: u64, speed: f64, export_dir: &str) {
    // Anything below `error` would draw over the alternate screen.
    super::init_logging("error");
    let dashboard = super::make_dashboard(opts);
    let mut app = crate::tui::app::App::new(
        dashboard,
        Duration::from_millis(refresh_ms.max(10)),
        speed,
        PathBuf::from(export_dir),
    );
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
