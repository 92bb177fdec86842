//! Presentation sink: where rendered counter text and chart series go.
//!
//! The core never draws anything itself. It pushes strings and series into a
//! [`PresentationSink`]; the TUI renders a [`MemorySink`], the HTTP server
//! serves one, and headless runs use [`LogSink`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Text elements the dashboard writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementId {
    TotalDownloads,
    TotalRevenue,
    Roi,
    Countries,
    Countdown,
}

impl ElementId {
    pub const ALL: [ElementId; 5] = [
        ElementId::TotalDownloads,
        ElementId::TotalRevenue,
        ElementId::Roi,
        ElementId::Countries,
        ElementId::Countdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TotalDownloads => "total_downloads",
            Self::TotalRevenue => "total_revenue",
            Self::Roi => "roi",
            Self::Countries => "countries",
            Self::Countdown => "countdown",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charts the dashboard feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    /// Per-platform download split.
    Platforms,
    /// Weekly downloads timeline.
    Timeline,
    /// Weekly revenue, drawn over the downloads timeline on its own axis.
    TimelineRevenue,
}

impl ChartId {
    pub const ALL: [ChartId; 3] = [ChartId::Platforms, ChartId::Timeline, ChartId::TimelineRevenue];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Platforms => "platforms",
            Self::Timeline => "timeline",
            Self::TimelineRevenue => "timeline_revenue",
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer of rendered dashboard output.
pub trait PresentationSink {
    /// Replace the text of an element.
    fn set_text(&mut self, element: ElementId, text: &str) -> Result<()>;

    /// Replace the data series of a chart.
    fn update_chart_series(&mut self, chart: ChartId, values: &[f64]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps the latest text and series per target in memory.
///
/// Targets can be detached to model an element that is missing from the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySink {
    texts: HashMap<ElementId, String>,
    charts: HashMap<ChartId, Vec<f64>>,
    #[serde(skip)]
    detached_elements: HashSet<ElementId>,
    #[serde(skip)]
    detached_charts: HashSet<ChartId>,
    writes: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink with `element` missing.
    pub fn without_element(mut self, element: ElementId) -> Self {
        self.detached_elements.insert(element);
        self
    }

    /// A sink with `chart` missing.
    pub fn without_chart(mut self, chart: ChartId) -> Self {
        self.detached_charts.insert(chart);
        self
    }

    pub fn text(&self, element: ElementId) -> Option<&str> {
        self.texts.get(&element).map(String::as_str)
    }

    pub fn series(&self, chart: ChartId) -> Option<&[f64]> {
        self.charts.get(&chart).map(Vec::as_slice)
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl PresentationSink for MemorySink {
    fn set_text(&mut self, element: ElementId, text: &str) -> Result<()> {
        if self.detached_elements.contains(&element) {
            return Err(Error::missing(element));
        }
        let slot = self.texts.entry(element).or_default();
        slot.clear();
        slot.push_str(text);
        self.writes += 1;
        Ok(())
    }

    fn update_chart_series(&mut self, chart: ChartId, values: &[f64]) -> Result<()> {
        if self.detached_charts.contains(&chart) {
            return Err(Error::missing(chart));
        }
        let slot = self.charts.entry(chart).or_default();
        slot.clear();
        slot.extend_from_slice(values);
        self.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

/// Writes every refresh to the log. Used by headless runs.
///
/// Every write goes to `trace`; a write that changes an element's text is
/// also logged at `debug`.
#[derive(Debug, Default)]
pub struct LogSink {
    last: HashMap<ElementId, String>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_text(&self, element: ElementId) -> Option<&str> {
        self.last.get(&element).map(String::as_str)
    }
}

impl PresentationSink for LogSink {
    fn set_text(&mut self, element: ElementId, text: &str) -> Result<()> {
        log::trace!("{element} <- {text}");
        if self.last.get(&element).map(String::as_str) != Some(text) {
            log::debug!("{element} = {text}");
            self.last.insert(element, text.to_string());
        }
        Ok(())
    }

    fn update_chart_series(&mut self, chart: ChartId, values: &[f64]) -> Result<()> {
        log::debug!("{chart} chart: {} points", values.len());
        Ok(())
    }
}
