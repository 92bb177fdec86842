//! TUI rendering.
//!
//! ┌──────────────────────────────────────────────┐
//! │  📊 studiopulse  Shadow Games   t=04:12  x1  │
//! ├──────────────────┬───────────────────────────┤
//! │  Downloads       │  Platforms                │
//! │  2.851.904       │  ██ ██ ▆▆ ▂▂              │
//! │  Revenue R$ 8.2M │  Steam PS Xbox Mobile     │
//! │  ROI 167%        │                           │
//! ├──────────────────┴───────────────────────────┤
//! │  Weekly downloads and revenue  ╭──────────   │
//! ├──────────────────────────────────────────────┤
//! │  🚀 VIRAL! +48.213 downloads in one hour!    │
//! ├──────────────────────────────────────────────┤
//! │  v: viral  c: countdown  e: export  q: quit  │
//! └──────────────────────────────────────────────┘

use super::app::App;
use ratatui::{prelude::*, widgets::*};
use studiopulse_core::{ChartId, ElementId, Phase, ToastKind};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // counters + platforms
            Constraint::Length(12), // timeline
            Constraint::Length(3), // toast
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_main(f, rows[1], app);
    draw_timeline(f, rows[2], app);
    draw_toast(f, rows[3], app);
    draw_keys(f, rows[4]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let clock = app.clock().as_secs();
    let studio = &app.dashboard().config().report.studio;
    let state = if app.is_paused() { "  ⏸ paused" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(Line::from(vec![
            Span::styled(" 📊 studiopulse ", Style::default().bold().fg(Color::Magenta)),
            Span::styled(format!(" {studio} "), Style::default().bold().fg(Color::White)),
            Span::styled(
                format!(
                    "  t={:02}:{:02}:{:02}  x{}{state} ",
                    clock / 3600,
                    (clock / 60) % 60,
                    clock % 60,
                    app.speed()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_counters(f, cols[0], app);
    draw_platforms(f, cols[1], app);
}

fn draw_counters(f: &mut Frame, area: Rect, app: &App) {
    let sink = app.sink();
    let text_of = |id: ElementId| sink.text(id).unwrap_or("-").to_string();
    let countdown = app.dashboard().countdown();
    let countdown_style = match countdown.phase() {
        Phase::Idle => Style::default().fg(Color::DarkGray),
        Phase::Running => Style::default().fg(Color::Green),
        Phase::Warning => Style::default().fg(Color::Yellow).bold(),
        Phase::Critical | Phase::Finished => Style::default().fg(Color::Red).bold(),
    };

    let lines = vec![
        Line::from(Span::styled("Total downloads", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            text_of(ElementId::TotalDownloads),
            Style::default().bold().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Revenue    ", Style::default().fg(Color::DarkGray)),
            Span::styled(text_of(ElementId::TotalRevenue), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("ROI        ", Style::default().fg(Color::DarkGray)),
            Span::styled(text_of(ElementId::Roi), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("Countries  ", Style::default().fg(Color::DarkGray)),
            Span::raw(text_of(ElementId::Countries)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Countdown  ", Style::default().fg(Color::DarkGray)),
            Span::styled(text_of(ElementId::Countdown), countdown_style),
        ]),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Launch ");
    let p = Paragraph::new(lines).block(block);
    f.render_widget(p, area);
}

fn draw_platforms(f: &mut Frame, area: Rect, app: &App) {
    let series = app.sink().series(ChartId::Platforms).unwrap_or(&[]);
    let channels = app.dashboard().store().channels();
    let bars: Vec<(&str, u64)> = channels
        .iter()
        .zip(series)
        .map(|(c, &v)| (c.name.as_str(), v.max(0.0) as u64))
        .collect();

    let width = if bars.is_empty() {
        1
    } else {
        ((area.width.saturating_sub(2)) / bars.len() as u16).saturating_sub(1).clamp(1, 14)
    };

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Platforms "))
        .data(bars.as_slice())
        .bar_width(width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    f.render_widget(chart, area);
}

fn draw_timeline(f: &mut Frame, area: Rect, app: &App) {
    let weekly = app.sink().series(ChartId::Timeline).unwrap_or(&[]);
    if weekly.is_empty() {
        let block = Block::default().borders(Borders::ALL).title(" Timeline ");
        f.render_widget(Paragraph::new("No timeline yet").block(block), area);
        return;
    }
    let revenue = app.sink().series(ChartId::TimelineRevenue).unwrap_or(&[]);
    let points = TimelinePoints::new(weekly, revenue);

    let mut datasets = vec![
        Dataset::default()
            .name("downloads")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&points.downloads),
    ];
    if !points.revenue.is_empty() {
        datasets.push(
            Dataset::default()
                .name("revenue (R$)")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Green))
                .data(&points.revenue),
        );
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Weekly downloads and revenue "),
        )
        .x_axis(Axis::default().bounds([1.0, points.weeks.max(2.0)]).labels(vec![
            Line::from("Week 1"),
            Line::from(format!("Week {}", weekly.len())),
        ]))
        .y_axis(
            Axis::default()
                .bounds([0.0, points.y_max])
                .labels(vec![Line::from("0"), Line::from(points.top_label())]),
        );

    f.render_widget(chart, area);
}

/// Chart coordinates for the weekly timeline.
///
/// ratatui charts have a single y axis, so revenue is rescaled onto the
/// downloads range and the top label carries both maxima.
struct TimelinePoints {
    downloads: Vec<(f64, f64)>,
    revenue: Vec<(f64, f64)>,
    weeks: f64,
    y_max: f64,
    revenue_max: f64,
}

impl TimelinePoints {
    fn new(weekly: &[f64], revenue: &[f64]) -> Self {
        let y_max = (weekly.iter().copied().fold(0.0, f64::max) * 1.1).max(1.0);
        let revenue_max = revenue.iter().copied().fold(0.0, f64::max) * 1.1;
        let scale = if revenue_max > 0.0 { y_max / revenue_max } else { 0.0 };
        Self {
            downloads: weekly
                .iter()
                .enumerate()
                .map(|(i, &v)| ((i + 1) as f64, v))
                .collect(),
            revenue: revenue
                .iter()
                .enumerate()
                .map(|(i, &v)| ((i + 1) as f64, v * scale))
                .collect(),
            weeks: weekly.len() as f64,
            y_max,
            revenue_max,
        }
    }

    fn top_label(&self) -> String {
        let downloads = format!("{:.1}M", self.y_max / 1_000_000.0);
        if self.revenue.is_empty() {
            downloads
        } else {
            format!("{downloads} / R$ {:.1}M", self.revenue_max / 1_000_000.0)
        }
    }
}

fn draw_toast(f: &mut Frame, area: Rect, app: &App) {
    let (text, style) = match app.dashboard().toast() {
        Some(toast) => (toast.message.clone(), toast_style(toast.kind)),
        None => (String::new(), Style::default()),
    };
    let title = match app.last_export() {
        Some(path) => format!(" Notifications  (last report: {}) ", path.display()),
        None => " Notifications ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    f.render_widget(Paragraph::new(text).style(style).block(block), area);
}

fn toast_style(kind: ToastKind) -> Style {
    match kind {
        ToastKind::Info => Style::default().fg(Color::Cyan),
        ToastKind::Success => Style::default().fg(Color::Green),
        ToastKind::Error => Style::default().fg(Color::Red).bold(),
        ToastKind::Battle => Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
    }
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " v: viral   c: countdown   r: reset   e: export   p: pause   +/-: speed   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
