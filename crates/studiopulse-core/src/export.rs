//! Report export.
//!
//! A report is a pure function of a [`Snapshot`] plus static metadata. It is
//! serialized to pretty JSON in memory first, then written through a temp
//! file in the target directory that is only renamed into place once the
//! write succeeded, so a failed export leaves nothing behind.
//!
//! # File name
//!
//! `studio-analytics-YYYY-MM-DD.json` (UTC date of generation).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::config::{ReportMetadata, WeekPoint};
use crate::error::{Error, Result};
use crate::store::Snapshot;

// ---------------------------------------------------------------------------
// Report document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_downloads: u64,
    pub total_revenue: f64,
    /// ROI rendered as a percentage string, e.g. `"164%"`.
    pub roi: String,
    pub countries: u32,
    pub platforms: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: String,
    pub generated_at: String,
    pub studio: String,
    pub summary: ReportSummary,
    pub timeline: Vec<WeekPoint>,
    pub analysis: ReportAnalysis,
    pub studiopulse_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub market_position: String,
    pub competitive_advantage: String,
    pub notes: Vec<String>,
}

impl Report {
    pub fn new(snapshot: &Snapshot, meta: &ReportMetadata, generated_at: SystemTime) -> Self {
        let since_epoch = generated_at.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            id: Uuid::new_v4().to_string(),
            generated_at: format_iso8601(since_epoch),
            studio: meta.studio.clone(),
            summary: ReportSummary {
                total_downloads: snapshot.total,
                total_revenue: snapshot.derived_value,
                roi: format!("{}%", snapshot.ratio),
                countries: snapshot.countries,
                platforms: snapshot
                    .channels
                    .iter()
                    .map(|c| (c.name.clone(), c.count))
                    .collect(),
            },
            timeline: snapshot.timeline.clone(),
            analysis: ReportAnalysis {
                market_position: meta.market_position.clone(),
                competitive_advantage: meta.competitive_advantage.clone(),
                notes: meta.notes.clone(),
            },
            studiopulse_version: crate::VERSION.to_string(),
        }
    }

    /// File name the report is saved under.
    pub fn file_name(&self) -> String {
        let date = self.generated_at.split('T').next().unwrap_or("undated");
        format!("studio-analytics-{date}.json")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report into `dir`. Returns the final path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let json = self.to_json()?;
        let path = dir.join(self.file_name());

        let mut tmp = tempfile::Builder::new()
            .prefix(".studio-analytics-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        log::info!("report {} written to {}", self.id, path.display());
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

/// Format a duration-since-epoch as a full ISO-8601 timestamp.
/// Example: `2026-02-15T01:30:00Z`
pub fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Seconds since Unix epoch to (year, month, day, hour, minute, second) UTC.
/// No leap seconds.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let months_days: [u64; 12] = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 12u64;
    for (i, &md) in months_days.iter().enumerate() {
        if days < md {
            month = i as u64 + 1;
            break;
        }
        days -= md;
    }

    (year, month, days + 1, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
