//! Error type shared by the dashboard engine.
//!
//! Only two things can go wrong at runtime: a presentation target that is not
//! there (recovered locally) and a failed report export (surfaced once as a
//! toast). Everything else is rejected up front by config validation.

use std::path::PathBuf;

/// Errors produced by the dashboard engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A text element or chart the core tried to refresh does not exist.
    #[error("presentation target not found: {target}")]
    MissingTarget { target: String },

    /// The report could not be turned into JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The report (or a config file) could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn missing(target: impl std::fmt::Display) -> Self {
        Self::MissingTarget {
            target: target.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only means a refresh was skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingTarget { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
