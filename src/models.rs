//! Core Data Models
//!
//! This module defines the data structures that flow through the query log
//! reporting pipeline, from raw JSONL lines to the rows of the final workbook.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`RawEntry`] - One decoded line of the AdGuard Home query log
//! 2. **Records**: [`Record`] - Validated, fixed-shape query record
//! 3. **Windowed**: [`WindowedRecord`] - Record placed on the reference day, with its hour
//! 4. **Aggregates**: [`BucketSummary`], [`ClientSummary`], [`TargetSummary`], [`DomainCount`]
//!
//! ## Analysis Options
//!
//! - [`Window`] - Peak hours (07:00-14:00) or the full day
//! - [`Scope`] - A single client address or every client
//! - [`AnalysisOptions`] - The immutable bundle handed to the analyzer

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanoseconds per millisecond, used to convert `Elapsed`.
pub const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Number of hours grouped into one time bucket.
pub const HOURS_PER_BUCKET: u32 = 3;

/// Wire shape of one query log line. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "T")]
    pub timestamp: String,
    #[serde(rename = "IP")]
    pub client_ip: String,
    #[serde(rename = "QH")]
    pub query_host: String,
    /// Elapsed time in nanoseconds
    #[serde(rename = "Elapsed")]
    pub elapsed: f64,
}

/// A validated query record. Never mutated after the parser creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<FixedOffset>,
    pub client_ip: String,
    pub domain: String,
    pub response_ms: f64,
}

impl Record {
    /// Calendar date in the record's own offset.
    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.naive_local().date()
    }

    /// Wall-clock time in the record's own offset.
    pub fn local_time(&self) -> NaiveTime {
        self.timestamp.naive_local().time()
    }
}

/// A record that passed the window filter, carrying its derived hour.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub client_ip: String,
    pub domain: String,
    pub response_ms: f64,
    pub hour: u32,
}

impl WindowedRecord {
    pub fn from_record(record: &Record) -> Self {
        Self {
            timestamp: record.timestamp,
            client_ip: record.client_ip.clone(),
            domain: record.domain.clone(),
            response_ms: record.response_ms,
            hour: record.timestamp.naive_local().hour(),
        }
    }

    pub fn bucket(&self) -> TimeBucket {
        TimeBucket::from_hour(self.hour)
    }
}

/// A three hour slice of the day, `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket(u32);

impl TimeBucket {
    pub fn from_hour(hour: u32) -> Self {
        Self(hour / HOURS_PER_BUCKET)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    /// Label such as `"06:00 - 08:59"`.
    pub fn label(self) -> String {
        let start = self.0 * HOURS_PER_BUCKET;
        let end = start + HOURS_PER_BUCKET - 1;
        format!("{:02}:00 - {:02}:59", start, end)
    }
}

/// Hour-of-day range used to select records on the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// 07:00:00 through 14:00:00
    Peak,
    /// The whole day, through the last instant of 23:59:59
    Full,
}

impl Window {
    pub fn start(self) -> NaiveTime {
        match self {
            Window::Peak => NaiveTime::from_hms_opt(7, 0, 0).expect("07:00:00 is a valid time"),
            Window::Full => NaiveTime::MIN,
        }
    }

    pub fn end(self) -> NaiveTime {
        match self {
            Window::Peak => NaiveTime::from_hms_opt(14, 0, 0).expect("14:00:00 is a valid time"),
            Window::Full => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .expect("23:59:59.999999999 is a valid time"),
        }
    }

    pub fn contains(self, time: NaiveTime) -> bool {
        self.start() <= time && time <= self.end()
    }

    /// Label such as `"Peak Hours (2024-05-01)"`.
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            Window::Peak => format!("Peak Hours ({})", date),
            Window::Full => format!("Full Day ({})", date),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Peak => write!(f, "peak"),
            Window::Full => write!(f, "full"),
        }
    }
}

/// Which clients an analysis covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    SingleEntity(String),
    AllEntities,
}

impl Scope {
    pub fn includes(&self, client_ip: &str) -> bool {
        match self {
            Scope::SingleEntity(target) => target == client_ip,
            Scope::AllEntities => true,
        }
    }

    /// Scope fragment used in report file names: `all_clients` or the
    /// target with every non-alphanumeric character replaced by `_`.
    pub fn file_tag(&self) -> String {
        match self {
            Scope::SingleEntity(target) => target
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect(),
            Scope::AllEntities => "all_clients".to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::SingleEntity(target) => write!(f, "client {}", target),
            Scope::AllEntities => write!(f, "all clients"),
        }
    }
}

/// Everything the analyzer needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub window: Window,
    pub scope: Scope,
    /// Analyse this day instead of the most recent day in the log
    pub pinned_date: Option<NaiveDate>,
}

/// One row of the `Activity_by_Time_Block` sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    #[serde(skip)]
    pub bucket: TimeBucket,
    #[serde(rename = "Time_Block")]
    pub label: String,
    #[serde(rename = "Query_Count")]
    pub query_count: usize,
    #[serde(rename = "Avg_Response_ms")]
    pub avg_response_ms: f64,
    #[serde(rename = "Top_Domain")]
    pub top_domain: String,
}

/// Per-client statistics, one row of `All_Clients_Summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    #[serde(rename = "Client_IP")]
    pub client_ip: String,
    #[serde(rename = "Total_Queries")]
    pub total_queries: usize,
    #[serde(rename = "Avg_Response_ms")]
    pub avg_response_ms: f64,
    #[serde(rename = "Most_Accessed_Domain")]
    pub most_accessed_domain: String,
    #[serde(rename = "Busiest_Hour")]
    pub busiest_hour: String,
}

/// Single-client summary, the one row of the `Summary` sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    #[serde(rename = "Client_IP")]
    pub client_ip: String,
    #[serde(rename = "Time_Range")]
    pub time_range: String,
    #[serde(rename = "Total_Queries")]
    pub total_queries: usize,
    #[serde(rename = "Avg_Response_ms")]
    pub avg_response_ms: f64,
    #[serde(rename = "Most_Accessed_Domain")]
    pub most_accessed_domain: String,
    #[serde(rename = "Busiest_Hour")]
    pub busiest_hour: String,
}

/// One entry of the top domain ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "Access_Count")]
    pub access_count: usize,
}

/// Round to two decimal places, the precision used in every summary sheet.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render an hour as `"HH:00"`.
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}
