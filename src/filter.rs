//! Window Filter
//!
//! Restricts a parsed log to one calendar day and an hour-of-day window.
//! The reference day is the most recent date present in the log unless a
//! date is pinned. The system clock is never consulted.

use crate::models::{Record, Window, WindowedRecord};
use chrono::NaiveDate;
use tracing::debug;

/// Records of the reference day that fall inside the window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedLog {
    pub reference_date: NaiveDate,
    pub window: Window,
    pub records: Vec<WindowedRecord>,
}

impl WindowedLog {
    /// `"Peak Hours (YYYY-MM-DD)"` or `"Full Day (YYYY-MM-DD)"`
    pub fn label(&self) -> String {
        self.window.label(self.reference_date)
    }
}

pub struct WindowFilter;

impl WindowFilter {
    /// Most recent calendar date observed, in each record's own offset.
    pub fn reference_date(records: &[Record]) -> Option<NaiveDate> {
        records.iter().map(Record::local_date).max()
    }

    /// Select the window. Returns `None` when no record matches, which
    /// includes an empty log.
    pub fn apply(
        records: &[Record],
        window: Window,
        pinned_date: Option<NaiveDate>,
    ) -> Option<WindowedLog> {
        let reference_date = pinned_date.or_else(|| Self::reference_date(records))?;

        let selected: Vec<WindowedRecord> = records
            .iter()
            .filter(|r| r.local_date() == reference_date && window.contains(r.local_time()))
            .map(WindowedRecord::from_record)
            .collect();

        debug!(
            %reference_date,
            %window,
            selected = selected.len(),
            total = records.len(),
            "Applied analysis window"
        );

        if selected.is_empty() {
            return None;
        }

        Some(WindowedLog {
            reference_date,
            window,
            records: selected,
        })
    }
}
