//! Query Log Analysis Engine
//!
//! This module provides the engine that runs one report from start to end.
//! It is the only place that knows the order of the pipeline stages.
//!
//! ## Core Functionality
//!
//! The [`QueryLogAnalyzer`] coordinates:
//!
//! 1. **Acquisition**: asks a [`LogSource`] for a local path
//! 2. **Parsing**: reads the log through the [`RecordCache`] when one is
//!    configured, falling back to [`QueryLogParser`]
//! 3. **Filtering**: keeps one day and one hour window ([`WindowFilter`])
//! 4. **Aggregation**: builds the scope summaries ([`Aggregator`])
//! 5. **Reporting**: assembles and writes the workbook
//!    ([`ReportAssembler`], [`XlsxWriter`])
//!
//! An empty window and an absent target client end the run early with a
//! [`RunOutcome`] variant instead of an error, and no workbook is written.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use querylog_analyzer::{AnalysisOptions, LocalFileSource, QueryLogAnalyzer, Scope, Window};
//!
//! # fn example() -> Result<(), querylog_analyzer::AnalysisError> {
//! let analyzer = QueryLogAnalyzer::new("reports");
//! let options = AnalysisOptions {
//!     window: Window::Peak,
//!     scope: Scope::AllEntities,
//!     pinned_date: None,
//! };
//!
//! let run = analyzer.run(&LocalFileSource::new("querylog.json"), &options)?;
//! println!("{:?}", run.outcome);
//! # Ok(())
//! # }
//! ```

use crate::aggregator::{Aggregation, Aggregator};
use crate::cache::RecordCache;
use crate::error::AnalysisResult;
use crate::filter::WindowFilter;
use crate::models::{AnalysisOptions, Scope, Window};
use crate::parser::{ParsedLog, QueryLogParser};
use crate::report::ReportAssembler;
use crate::source::LogSource;
use crate::xlsx::XlsxWriter;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Line accounting of the parsed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub records: usize,
    pub malformed_lines: usize,
    pub total_lines: usize,
}

impl From<&ParsedLog> for ParseStats {
    fn from(parsed: &ParsedLog) -> Self {
        Self {
            records: parsed.records.len(),
            malformed_lines: parsed.malformed_lines,
            total_lines: parsed.total_lines,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A workbook was written to `path`
    Report {
        path: PathBuf,
        aggregation: Aggregation,
    },
    /// Nothing in the log falls inside the window
    NoActivity {
        window: Window,
        reference_date: Option<NaiveDate>,
    },
    /// The window has records, none of them from the target client
    NoActivityForTarget {
        client_ip: String,
        window_label: String,
    },
}

impl RunOutcome {
    pub fn report_path(&self) -> Option<&Path> {
        match self {
            RunOutcome::Report { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result of one run: the parse accounting plus the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    pub stats: ParseStats,
    pub outcome: RunOutcome,
}

pub struct QueryLogAnalyzer {
    parser: QueryLogParser,
    cache: Option<RecordCache>,
    output_dir: PathBuf,
}

impl QueryLogAnalyzer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser: QueryLogParser::new(),
            cache: None,
            output_dir: output_dir.into(),
        }
    }

    /// Memoize parses in `cache`.
    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run the whole pipeline for one set of options.
    pub fn run(&self, source: &dyn LogSource, options: &AnalysisOptions) -> AnalysisResult<AnalysisRun> {
        let log_path = source.fetch()?;
        let parsed = self.load(&log_path)?;
        let stats = ParseStats::from(&parsed);
        let outcome = self.analyze(&parsed, options)?;
        Ok(AnalysisRun { stats, outcome })
    }

    /// Parse `log_path`, going through the cache when one is set.
    pub fn load(&self, log_path: &Path) -> AnalysisResult<ParsedLog> {
        if let Some(cache) = &self.cache {
            if let Some(parsed) = cache.load(log_path) {
                return Ok(parsed);
            }
        }

        let parsed = self.parser.parse_file(log_path)?;

        if let Some(cache) = &self.cache {
            cache.save(log_path, &parsed);
        }

        Ok(parsed)
    }

    /// Filter, aggregate and write the report for an already parsed log.
    pub fn analyze(&self, parsed: &ParsedLog, options: &AnalysisOptions) -> AnalysisResult<RunOutcome> {
        let Some(windowed) = WindowFilter::apply(&parsed.records, options.window, options.pinned_date)
        else {
            let reference_date = options
                .pinned_date
                .or_else(|| WindowFilter::reference_date(&parsed.records));
            info!(window = %options.window, ?reference_date, "No activity in window");
            return Ok(RunOutcome::NoActivity {
                window: options.window,
                reference_date,
            });
        };

        let Some(aggregation) = Aggregator::aggregate(&windowed, &options.scope) else {
            // Aggregation is only empty when a single target is absent
            let client_ip = match &options.scope {
                Scope::SingleEntity(ip) => ip.clone(),
                Scope::AllEntities => String::new(),
            };
            info!(client_ip = %client_ip, window = %windowed.label(), "No activity for target");
            return Ok(RunOutcome::NoActivityForTarget {
                client_ip,
                window_label: windowed.label(),
            });
        };

        let workbook = ReportAssembler::assemble(&aggregation);
        let path = XlsxWriter::write(&workbook, &self.output_dir)?;

        info!(
            scope = %options.scope,
            window = %aggregation.window_label,
            queries = aggregation.total_queries(),
            "Analysis complete"
        );

        Ok(RunOutcome::Report { path, aggregation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::QueryLogParser;
    use tempfile::TempDir;

    fn parsed(lines: &[&str]) -> ParsedLog {
        let input = lines.join("\n");
        QueryLogParser::new().parse_reader(input.as_bytes()).unwrap()
    }

    fn options(window: Window, scope: Scope) -> AnalysisOptions {
        AnalysisOptions {
            window,
            scope,
            pinned_date: None,
        }
    }

    #[test]
    fn test_empty_log_is_no_activity() {
        let temp_dir = TempDir::new().unwrap();
        let analyzer = QueryLogAnalyzer::new(temp_dir.path());

        let outcome = analyzer
            .analyze(&ParsedLog::default(), &options(Window::Full, Scope::AllEntities))
            .unwrap();

        assert_eq!(
            outcome,
            RunOutcome::NoActivity {
                window: Window::Full,
                reference_date: None
            }
        );
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_absent_target_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let analyzer = QueryLogAnalyzer::new(temp_dir.path());
        let log = parsed(&[
            r#"{"T":"2024-05-01T08:00:00Z","IP":"10.0.0.5","QH":"a.com","Elapsed":1000000}"#,
        ]);

        let outcome = analyzer
            .analyze(&log, &options(Window::Peak, Scope::SingleEntity("9.9.9.9".to_string())))
            .unwrap();

        match outcome {
            RunOutcome::NoActivityForTarget { client_ip, window_label } => {
                assert_eq!(client_ip, "9.9.9.9");
                assert_eq!(window_label, "Peak Hours (2024-05-01)");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(outcome_dir_is_empty(temp_dir.path()));
    }

    #[test]
    fn test_report_is_written_to_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let analyzer = QueryLogAnalyzer::new(temp_dir.path().join("out"));
        let log = parsed(&[
            r#"{"T":"2024-05-01T08:00:00Z","IP":"10.0.0.5","QH":"a.com","Elapsed":1000000}"#,
            r#"{"T":"2024-05-01T09:30:00Z","IP":"10.0.0.6","QH":"b.com","Elapsed":3000000}"#,
        ]);

        let outcome = analyzer
            .analyze(&log, &options(Window::Full, Scope::AllEntities))
            .unwrap();

        let path = outcome.report_path().unwrap();
        assert!(path.exists());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "adguard_analysis_all_clients_2024-05-01.xlsx"
        );
    }

    fn outcome_dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }
}
