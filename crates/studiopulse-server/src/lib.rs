//! HTTP surface for the studiopulse dashboard.
//!
//! One [`Dashboard`] lives behind a mutex. A background task pumps it on a
//! short interval, and every handler pumps it once more before reading, so
//! responses always reflect the dashboard clock at request time.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Mutex;

use studiopulse_core::{Dashboard, DashboardStats, MemorySink, Phase, Snapshot, Toast};

/// How often the background task advances the dashboard.
const PUMP_INTERVAL: Duration = Duration::from_millis(250);

/// Dashboard plus the view it renders into.
struct Live {
    dashboard: Dashboard,
    sink: MemorySink,
}

/// Shared server state.
struct AppState {
    live: Mutex<Live>,
    started: Instant,
    /// Dashboard seconds per wall-clock second.
    time_scale: f64,
}

impl AppState {
    fn dashboard_now(&self) -> Duration {
        self.started.elapsed().mul_f64(self.time_scale)
    }

    /// Lock, advance to the current dashboard time, and hand back the guard.
    async fn pumped(&self) -> tokio::sync::MutexGuard<'_, Live> {
        let mut guard = self.live.lock().await;
        let now = self.dashboard_now();
        let live = &mut *guard;
        live.dashboard.pump(now, &mut live.sink);
        guard
    }
}

#[derive(Serialize)]
struct CountdownView {
    display: String,
    phase: Phase,
    running: bool,
}

#[derive(Serialize)]
struct SnapshotResponse {
    snapshot: Snapshot,
    view: MemorySink,
    toast: Option<Toast>,
    countdown: CountdownView,
}

#[derive(Serialize)]
struct SpecialResponse {
    delta: u64,
    shares: Vec<(String, u64)>,
    revenue_delta: f64,
    message: Option<String>,
    total: u64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: f64,
    dashboard_secs: f64,
    pending_tasks: usize,
    stats: DashboardStats,
}

fn countdown_view(live: &Live) -> CountdownView {
    let countdown = live.dashboard.countdown();
    CountdownView {
        display: countdown.display(),
        phase: countdown.phase(),
        running: countdown.is_running(),
    }
}

async fn handle_snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    let live = state.pumped().await;
    Json(SnapshotResponse {
        snapshot: live.dashboard.snapshot(),
        view: live.sink.clone(),
        toast: live.dashboard.toast().cloned(),
        countdown: countdown_view(&live),
    })
}

async fn handle_toast(State(state): State<Arc<AppState>>) -> Json<Option<Toast>> {
    let live = state.pumped().await;
    Json(live.dashboard.toast().cloned())
}

async fn handle_report(State(state): State<Arc<AppState>>) -> Response {
    let live = state.pumped().await;
    let report = live.dashboard.report(SystemTime::now());
    drop(live);

    match report.to_json() {
        Ok(body) => {
            log::info!("report {} downloaded", report.id);
            let disposition = format!("attachment; filename=\"{}\"", report.file_name());
            (
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            log::error!("report serialization failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Report export failed. Please try again.",
            )
                .into_response()
        }
    }
}

async fn handle_special(State(state): State<Arc<AppState>>) -> Json<SpecialResponse> {
    let mut guard = state.pumped().await;
    let live = &mut *guard;
    let outcome = live.dashboard.trigger_special_event(&mut live.sink);
    let shares = live
        .dashboard
        .store()
        .channels()
        .iter()
        .map(|c| c.name.clone())
        .zip(outcome.partition.shares().iter().copied())
        .collect();
    Json(SpecialResponse {
        delta: outcome.partition.total(),
        shares,
        revenue_delta: outcome.revenue_delta,
        message: outcome.notice.map(|n| n.message),
        total: live.dashboard.store().total(),
    })
}

async fn handle_countdown_start(State(state): State<Arc<AppState>>) -> Json<CountdownView> {
    let mut guard = state.pumped().await;
    let live = &mut *guard;
    live.dashboard.start_countdown(&mut live.sink);
    Json(countdown_view(live))
}

async fn handle_countdown_reset(State(state): State<Arc<AppState>>) -> Json<CountdownView> {
    let mut guard = state.pumped().await;
    let live = &mut *guard;
    live.dashboard.reset_countdown(&mut live.sink);
    Json(countdown_view(live))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let live = state.pumped().await;
    Json(HealthResponse {
        status: if live.dashboard.is_started() {
            "running".to_string()
        } else {
            "stopped".to_string()
        },
        version: studiopulse_core::VERSION.to_string(),
        uptime_secs: state.started.elapsed().as_secs_f64(),
        dashboard_secs: live.dashboard.now().as_secs_f64(),
        pending_tasks: live.dashboard.pending_tasks(),
        stats: live.dashboard.stats(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let live = state.live.lock().await;
    let studio = live.dashboard.config().report.studio.clone();
    drop(live);

    Json(serde_json::json!({
        "name": "studiopulse",
        "studio": studio,
        "version": studiopulse_core::VERSION,
        "time_scale": state.time_scale,
        "endpoints": {
            "/": "This API index",
            "/snapshot": "Current metrics, rendered view, visible toast and countdown",
            "/report": "Download the analytics report as JSON",
            "/events/special": { "method": "POST", "description": "Fire a viral spike now" },
            "/countdown/start": { "method": "POST", "description": "Start or restart the countdown" },
            "/countdown/reset": { "method": "POST", "description": "Stop the countdown" },
            "/toast": "The toast currently on screen, or null",
            "/health": "Health check",
        },
    }))
}

fn build_state(mut dashboard: Dashboard, time_scale: f64) -> Arc<AppState> {
    let mut sink = MemorySink::new();
    dashboard.start(Duration::ZERO, &mut sink);
    Arc::new(AppState {
        live: Mutex::new(Live { dashboard, sink }),
        started: Instant::now(),
        // Non-finite scales would overflow `Duration::mul_f64`.
        time_scale: if time_scale.is_finite() { time_scale.max(0.0) } else { 1.0 },
    })
}

/// Build the axum router.
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/snapshot", get(handle_snapshot))
        .route("/report", get(handle_report))
        .route("/events/special", post(handle_special))
        .route("/countdown/start", post(handle_countdown_start))
        .route("/countdown/reset", post(handle_countdown_reset))
        .route("/toast", get(handle_toast))
        .route("/health", get(handle_health))
        .with_state(state)
}

fn spawn_pump(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PUMP_INTERVAL);
        loop {
            ticker.tick().await;
            drop(state.pumped().await);
        }
    })
}

/// Run the HTTP dashboard server until the listener fails.
pub async fn run_server(
    dashboard: Dashboard,
    host: &str,
    port: u16,
    time_scale: f64,
) -> std::io::Result<()> {
    let state = build_state(dashboard, time_scale);
    let app = build_router(state.clone());
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    let pump = spawn_pump(state);
    let result = axum::serve(listener, app).await;
    pump.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use studiopulse_core::{DashboardConfig, ToastKind};

    fn state(scale: f64) -> Arc<AppState> {
        let dashboard = Dashboard::seeded(DashboardConfig::default(), 21).unwrap();
        build_state(dashboard, scale)
    }

    #[tokio::test]
    async fn snapshot_reports_seed_values() {
        let state = state(0.0);
        let Json(resp) = handle_snapshot(State(state)).await;
        assert_eq!(resp.snapshot.total, 2_847_392);
        assert_eq!(resp.countdown.display, "05:00");
        assert_eq!(resp.countdown.phase, Phase::Idle);
        assert_eq!(resp.toast.unwrap().kind, ToastKind::Success);
    }

    #[tokio::test]
    async fn non_finite_time_scale_runs_in_real_time() {
        let state = state(f64::INFINITY);
        assert_eq!(state.time_scale, 1.0);
        let Json(resp) = handle_snapshot(State(state)).await;
        assert_eq!(resp.snapshot.total, 2_847_392);
        assert_eq!(self::state(f64::NAN).time_scale, 1.0);
    }

    #[tokio::test]
    async fn special_event_grows_total() {
        let state = state(0.0);
        let Json(resp) = handle_special(State(state.clone())).await;
        assert!((20_000..70_000).contains(&resp.delta));
        assert_eq!(resp.total, 2_847_392 + resp.delta);
        assert_eq!(resp.shares.len(), 4);
        assert_eq!(resp.shares.iter().map(|(_, n)| n).sum::<u64>(), resp.delta);

        let Json(toast) = handle_toast(State(state)).await;
        assert_eq!(toast.unwrap().kind, ToastKind::Battle);
    }

    #[tokio::test]
    async fn report_is_an_attachment() {
        let resp = handle_report(State(state(0.0))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"studio-analytics-"));
    }

    #[tokio::test]
    async fn countdown_start_and_reset() {
        let state = state(0.0);
        let Json(started) = handle_countdown_start(State(state.clone())).await;
        assert!(started.running);
        assert_eq!(started.phase, Phase::Running);
        let Json(reset) = handle_countdown_reset(State(state)).await;
        assert!(!reset.running);
        assert_eq!(reset.display, "05:00");
    }

    #[tokio::test]
    async fn health_counts_scheduled_tasks() {
        let Json(health) = handle_health(State(state(0.0))).await;
        assert_eq!(health.status, "running");
        assert!(health.pending_tasks >= 4);
        assert_eq!(health.stats.steady_updates, 0);
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let Json(index) = handle_index(State(state(1.0))).await;
        assert_eq!(index["studio"], "Shadow Games");
        assert!(index["endpoints"]["/snapshot"].is_string());
    }
}
