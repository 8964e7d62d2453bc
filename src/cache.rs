//! Parse cache
//!
//! Memoizes the parsed record set of a query log as a JSON file, so a
//! second report over the same file skips parsing. The cache is only a
//! shortcut: any failure to read, decode or write it degrades to a normal
//! parse, and it is discarded whenever the log's size or modification time
//! no longer match the ones it was built from.

use crate::error::CacheError;
use crate::parser::ParsedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Identity of the log a cache entry was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFingerprint {
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            len: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    source: SourceFingerprint,
    parsed: ParsedLog,
}

pub struct RecordCache {
    cache_path: PathBuf,
}

impl RecordCache {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
        }
    }

    /// Cached parse of `source`, or `None` on any kind of miss.
    pub fn load(&self, source: &Path) -> Option<ParsedLog> {
        match self.try_load(source) {
            Ok(parsed) => {
                info!(
                    cache = %self.cache_path.display(),
                    records = parsed.records.len(),
                    "Loaded parsed log from cache"
                );
                Some(parsed)
            }
            Err(CacheError::Io { source: ref err, .. })
                if err.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(cache = %self.cache_path.display(), "No cache file");
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not use cache, re-parsing from source");
                None
            }
        }
    }

    fn try_load(&self, source: &Path) -> Result<ParsedLog, CacheError> {
        let content = fs::read_to_string(&self.cache_path).map_err(|e| CacheError::Io {
            path: self.cache_path.clone(),
            source: e,
        })?;
        let entry: CacheEntry = serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
            path: self.cache_path.clone(),
            source: e,
        })?;

        let current = SourceFingerprint::of(source).map_err(|e| CacheError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        if current != entry.source {
            return Err(CacheError::Stale(self.cache_path.clone()));
        }

        Ok(entry.parsed)
    }

    /// Store a parse of `source`. Failures are logged and otherwise ignored.
    pub fn save(&self, source: &Path, parsed: &ParsedLog) {
        match self.try_save(source, parsed) {
            Ok(()) => info!(cache = %self.cache_path.display(), "Cache saved"),
            Err(e) => warn!(error = %e, "Could not save cache file"),
        }
    }

    fn try_save(&self, source: &Path, parsed: &ParsedLog) -> Result<(), CacheError> {
        let io_error = |e: std::io::Error| CacheError::Io {
            path: self.cache_path.clone(),
            source: e,
        };

        let source_fingerprint = SourceFingerprint::of(source).map_err(|e| CacheError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        // Serialize through a borrowed view to avoid cloning every record
        let content = serde_json::to_string(&CacheEntryRef {
            source: &source_fingerprint,
            parsed,
        })
        .map_err(|e| CacheError::Encode {
            path: self.cache_path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }
        fs::write(&self.cache_path, content).map_err(io_error)
    }
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    source: &'a SourceFingerprint,
    parsed: &'a ParsedLog,
}
