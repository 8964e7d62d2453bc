//! AdGuard Query Log Analyzer
//!
//! Turns an AdGuard Home query log (JSON Lines) into a multi-sheet `.xlsx`
//! report for one day: who queried what, how fast the resolver answered,
//! and when the network was busiest.
//!
//! ## Core Features
//!
//! - **Tolerant parsing**: malformed lines are counted and skipped, never fatal
//! - **Windowed analysis**: peak hours (07:00-14:00) or the full day of the
//!   most recent date in the log, or a pinned date
//! - **Two scopes**: a single client, or every client side by side
//! - **Deterministic reports**: fixed sheet names, column sets and file names
//! - **Parse cache**: repeated runs over an unchanged log skip parsing
//! - **Delivery**: optional HTTP upload of the finished report
//!
//! ## Architecture Overview
//!
//! - [`parser`] - JSONL decoding into [`Record`]s with line accounting
//! - [`filter`] - reference day and hour window selection
//! - [`aggregator`] - per-client, per-bucket and per-domain statistics
//! - [`report`] - sheet and column layout of the workbook
//! - [`xlsx`] - `.xlsx` serialization
//! - [`analyzer`] - runs the stages in order
//! - [`cache`], [`source`], `delivery` - collaborators around the core
//! - [`config`] - configuration file and environment variable support
//! - [`logging`] - structured logging with JSON and pretty formats
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use querylog_analyzer::{AnalysisOptions, LocalFileSource, QueryLogAnalyzer, Scope, Window};
//!
//! # fn example() -> Result<(), querylog_analyzer::AnalysisError> {
//! let analyzer = QueryLogAnalyzer::new(".");
//! let options = AnalysisOptions {
//!     window: Window::Full,
//!     scope: Scope::SingleEntity("192.168.1.20".to_string()),
//!     pinned_date: None,
//! };
//! let run = analyzer.run(&LocalFileSource::new("querylog.json"), &options)?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod parser;
pub mod report;
pub mod source;
pub mod timestamp_parser;
pub mod xlsx;

#[cfg(feature = "delivery")]
pub mod delivery;

pub use analyzer::{AnalysisRun, ParseStats, QueryLogAnalyzer, RunOutcome};
pub use error::{AnalysisError, AnalysisResult};
pub use models::*;
pub use source::{LocalFileSource, LogSource};
