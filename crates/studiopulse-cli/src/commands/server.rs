use super::GlobalOpts;

pub fn run(opts: &GlobalOpts<'_>, host: &str, port: u16, speed: f64) {
    super::init_logging("info");
    let dashboard = super::make_dashboard(opts);
    let studio = dashboard.config().report.studio.clone();

    let base = format!("http://{host}:{port}");

    println!("📊 studiopulse server v{}", studiopulse_core::VERSION);
    println!("   {base}");
    println!("   {studio} dashboard, clock x{speed}");
    println!();
    println!("   Endpoints:");
    println!("     GET  /                 API index (try: curl {base})");
    println!("     GET  /snapshot         Metrics, rendered view, toast, countdown");
    println!("     GET  /report           Download the analytics report");
    println!("     POST /events/special   Fire a viral spike now");
    println!("     POST /countdown/start  Start or restart the countdown");
    println!("     POST /countdown/reset  Stop the countdown");
    println!("     GET  /toast            Toast on screen, or null");
    println!("     GET  /health           Health check");
    println!();
    println!("   Examples:");
    println!("     curl {base}/snapshot");
    println!("     curl -OJ {base}/report");
    println!("     curl -X POST {base}/events/special");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(studiopulse_server::run_server(dashboard, host, port, speed)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
