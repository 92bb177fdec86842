//! TUI application state and event loop.
//!
//! The dashboard clock is wall time scaled by `speed`. Every loop iteration
//! advances the clock and pumps the dashboard into a [`MemorySink`], which
//! `ui::draw` then renders. Pausing freezes the clock; manual actions still
//! go through.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use studiopulse_core::{Dashboard, MemorySink};

const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 64.0;

pub struct App {
    dashboard: Dashboard,
    sink: MemorySink,
    running: bool,
    paused: bool,
    refresh_rate: Duration,
    speed: f64,
    /// Dashboard time.
    clock: Duration,
    export_dir: PathBuf,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(dashboard: Dashboard, refresh_rate: Duration, speed: f64, export_dir: PathBuf) -> Self {
        Self {
            dashboard,
            sink: MemorySink::new(),
            running: true,
            paused: false,
            refresh_rate,
            speed: if speed.is_nan() { 1.0 } else { speed.clamp(MIN_SPEED, MAX_SPEED) },
            clock: Duration::ZERO,
            export_dir,
            last_export: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before the panic message prints.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if let Some(path) = &self.last_export {
            println!("Last report: {}", path.display());
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.start();
        let mut last_tick = Instant::now();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(self.refresh_rate)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            let wall = last_tick.elapsed();
            last_tick = Instant::now();
            self.advance(wall);
        }

        self.dashboard.stop();
        Ok(())
    }

    /// Start the dashboard at clock zero.
    pub fn start(&mut self) {
        self.clock = Duration::ZERO;
        self.dashboard.start(self.clock, &mut self.sink);
    }

    /// Move the clock forward by `wall` scaled by speed, then run due jobs.
    pub fn advance(&mut self, wall: Duration) {
        if !self.paused {
            self.clock += wall.mul_f64(self.speed);
        }
        self.dashboard.pump(self.clock, &mut self.sink);
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('p') | KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('v') => {
                self.dashboard.trigger_special_event(&mut self.sink);
            }
            KeyCode::Char('c') => self.dashboard.start_countdown(&mut self.sink),
            KeyCode::Char('r') => self.dashboard.reset_countdown(&mut self.sink),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char(']') => {
                self.speed = (self.speed * 2.0).min(MAX_SPEED);
            }
            KeyCode::Char('-') | KeyCode::Char('[') => {
                self.speed = (self.speed / 2.0).max(MIN_SPEED);
            }
            _ => {}
        }
    }

    /// Export a report. The outcome shows up as a toast either way.
    fn export(&mut self) {
        if let Ok(path) = self
            .dashboard
            .export_report(&self.export_dir, SystemTime::now())
        {
            self.last_export = Some(path);
        }
    }

    // --- Accessors for the renderer ---

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn sink(&self) -> &MemorySink {
        &self.sink
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studiopulse_core::{DashboardConfig, ElementId, Phase, ToastKind};

    fn app(dir: &Path) -> App {
        let dashboard = Dashboard::seeded(DashboardConfig::default(), 8).unwrap();
        let mut app = App::new(dashboard, Duration::from_millis(50), 1.0, dir.to_path_buf());
        app.start();
        app
    }

    #[test]
    fn advance_scales_by_speed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.handle_key(KeyCode::Char('+'));
        app.handle_key(KeyCode::Char('+'));
        assert_eq!(app.speed(), 4.0);
        app.advance(Duration::from_secs(10));
        assert_eq!(app.clock(), Duration::from_secs(40));
        assert_eq!(app.dashboard().stats().steady_updates, 1);
        assert!(app.sink().text(ElementId::TotalDownloads).is_some());
    }

    #[test]
    fn speed_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        for _ in 0..20 {
            app.handle_key(KeyCode::Char('-'));
        }
        assert_eq!(app.speed(), MIN_SPEED);
        for _ in 0..20 {
            app.handle_key(KeyCode::Char(']'));
        }
        assert_eq!(app.speed(), MAX_SPEED);
    }

    #[test]
    fn nan_speed_falls_back_to_real_time() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::seeded(DashboardConfig::default(), 8).unwrap();
        let mut app = App::new(dashboard, Duration::from_millis(50), f64::NAN, dir.path().to_path_buf());
        app.start();
        app.advance(Duration::from_secs(2));
        assert_eq!(app.speed(), 1.0);
        assert_eq!(app.clock(), Duration::from_secs(2));
        let fast = Dashboard::seeded(DashboardConfig::default(), 8).unwrap();
        let app = App::new(fast, Duration::from_millis(50), f64::INFINITY, dir.path().to_path_buf());
        assert_eq!(app.speed(), MAX_SPEED);
    }

    #[test]
    fn pause_freezes_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.handle_key(KeyCode::Char('p'));
        app.advance(Duration::from_secs(120));
        assert!(app.is_paused());
        assert_eq!(app.clock(), Duration::ZERO);
        assert_eq!(app.dashboard().stats().steady_updates, 0);
    }

    #[test]
    fn viral_key_fires_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let before = app.dashboard().snapshot().total;
        app.handle_key(KeyCode::Char('v'));
        assert!(app.dashboard().snapshot().total >= before + 20_000);
        assert_eq!(app.dashboard().toast().unwrap().kind, ToastKind::Battle);
    }

    #[test]
    fn countdown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.handle_key(KeyCode::Char('c'));
        app.advance(Duration::from_secs(3));
        assert_eq!(app.dashboard().countdown().phase(), Phase::Running);
        assert_eq!(app.sink().text(ElementId::Countdown), Some("04:57"));
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.dashboard().countdown().phase(), Phase::Idle);
        assert_eq!(app.sink().text(ElementId::Countdown), Some("05:00"));
    }

    #[test]
    fn export_key_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.handle_key(KeyCode::Char('e'));
        let path = app.last_export().unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.exists());
        assert_eq!(app.dashboard().toast().unwrap().kind, ToastKind::Success);
    }

    #[test]
    fn export_into_missing_dir_toasts_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir.path().join("missing"));
        app.handle_key(KeyCode::Char('e'));
        assert!(app.last_export().is_none());
        assert_eq!(app.dashboard().toast().unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert!(app.is_running());
        app.handle_key(KeyCode::Esc);
        assert!(!app.is_running());
    }
}
