//! Query log sources
//!
//! The analyzer only ever reads a local file. Anything that fetches the log
//! from elsewhere implements [`LogSource`] and hands back a local path.

use crate::error::{AnalysisError, AnalysisResult};
use std::fs::File;
use std::path::PathBuf;

pub trait LogSource {
    /// Make the log available locally and return its path.
    fn fetch(&self) -> AnalysisResult<PathBuf>;
}

/// A log that already sits on the local file system.
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for LocalFileSource {
    fn fetch(&self) -> AnalysisResult<PathBuf> {
        // Opening is the only reliable readability check
        File::open(&self.path).map_err(|e| AnalysisError::source_unavailable(&self.path, e))?;
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_existing_file_is_fetched() {
        let file = NamedTempFile::new().unwrap();
        let source = LocalFileSource::new(file.path());
        assert_eq!(source.fetch().unwrap(), file.path());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = LocalFileSource::new("/no/such/querylog.json");
        assert!(source.fetch().unwrap_err().is_source_unavailable());
    }
}
