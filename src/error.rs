//! Error types for the reporting pipeline and its collaborators
//!
//! Per-line parse failures are not errors: they are counted in
//! [`crate::parser::ParsedLog`]. Empty windows are not errors either: they
//! are [`crate::analyzer::RunOutcome`] variants.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of the core pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The query log could not be opened or read at all
    #[error("Query log {path} is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook could not be written
    #[error("Failed to write report {path}: {message}")]
    ReportWrite { path: PathBuf, message: String },
}

impl AnalysisError {
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Check if the input log was the problem
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, AnalysisError::SourceUnavailable { .. })
    }
}

/// Failures of the parse cache. Never surfaced past the cache itself.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode cache {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Cache exists but was built from a different version of the log
    #[error("Cache file {0} is stale")]
    Stale(PathBuf),
}

/// Failures uploading a finished report. The report stays on disk.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to read report {path}: {source}")]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Upload to {url} was rejected with status {status}")]
    Rejected { url: String, status: u16 },
}

/// Result type for the core pipeline
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
