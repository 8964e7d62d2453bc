//! Report Assembly
//!
//! Arranges an [`Aggregation`] into the named sheets of the output workbook.
//! Sheet names, sheet order and column order are a compatibility contract
//! with whatever reads the report downstream; change them only together
//! with those consumers.
//!
//! | Scope      | Sheets                                                          |
//! |------------|-----------------------------------------------------------------|
//! | one client | `Summary`, `Top_Domains`, `Activity_by_Time_Block`, `Raw_Data`  |
//! | all        | `All_Clients_Summary`, `Activity_by_Time_Block`, `Raw_Data`     |

use crate::aggregator::{Aggregation, ScopeSummary};
use crate::models::{
    BucketSummary, ClientSummary, DomainCount, Scope, TargetSummary, WindowedRecord,
};
use chrono::NaiveDate;

pub const SUMMARY_SHEET: &str = "Summary";
pub const ALL_CLIENTS_SHEET: &str = "All_Clients_Summary";
pub const TOP_DOMAINS_SHEET: &str = "Top_Domains";
pub const TIME_BLOCK_SHEET: &str = "Activity_by_Time_Block";
pub const RAW_DATA_SHEET: &str = "Raw_Data";

pub const SUMMARY_COLUMNS: &[&str] = &[
    "Client_IP",
    "Time_Range",
    "Total_Queries",
    "Avg_Response_ms",
    "Most_Accessed_Domain",
    "Busiest_Hour",
];
pub const ALL_CLIENTS_COLUMNS: &[&str] = &[
    "Client_IP",
    "Total_Queries",
    "Avg_Response_ms",
    "Most_Accessed_Domain",
    "Busiest_Hour",
];
pub const TOP_DOMAINS_COLUMNS: &[&str] = &["Domain", "Access_Count"];
pub const TIME_BLOCK_COLUMNS: &[&str] = &["Time_Block", "Query_Count", "Avg_Response_ms", "Top_Domain"];
pub const RAW_DATA_COLUMNS: &[&str] = &["timestamp", "client_ip", "domain", "response_ms"];

/// Format of the `Raw_Data` timestamp column.
pub const RAW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix shared by every report file name.
pub const FILE_PREFIX: &str = "adguard_analysis";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Count(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// One named table of the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Cell of `row` under `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }
}

/// The assembled report, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportWorkbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl ReportWorkbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&'static str> {
        self.sheets.iter().map(|s| s.name).collect()
    }
}

pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(aggregation: &Aggregation) -> ReportWorkbook {
        let mut sheets = Vec::new();

        match &aggregation.summary {
            ScopeSummary::Target(summary) => {
                sheets.push(Self::summary_sheet(summary));
                sheets.push(Self::top_domains_sheet(&aggregation.top_domains));
            }
            ScopeSummary::Clients(clients) => {
                sheets.push(Self::all_clients_sheet(clients));
            }
        }
        sheets.push(Self::time_block_sheet(&aggregation.time_blocks));
        sheets.push(Self::raw_data_sheet(&aggregation.records));

        ReportWorkbook {
            file_name: Self::file_name(&aggregation.scope, aggregation.reference_date),
            sheets,
        }
    }

    /// `adguard_analysis_<scope>_<YYYY-MM-DD>.xlsx`
    pub fn file_name(scope: &Scope, reference_date: NaiveDate) -> String {
        format!("{}_{}_{}.xlsx", FILE_PREFIX, scope.file_tag(), reference_date)
    }

    fn summary_sheet(summary: &TargetSummary) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET, SUMMARY_COLUMNS);
        sheet.push(vec![
            summary.client_ip.as_str().into(),
            summary.time_range.as_str().into(),
            summary.total_queries.into(),
            summary.avg_response_ms.into(),
            summary.most_accessed_domain.as_str().into(),
            summary.busiest_hour.as_str().into(),
        ]);
        sheet
    }

    fn all_clients_sheet(clients: &[ClientSummary]) -> Sheet {
        let mut sheet = Sheet::new(ALL_CLIENTS_SHEET, ALL_CLIENTS_COLUMNS);
        for client in clients {
            sheet.push(vec![
                client.client_ip.as_str().into(),
                client.total_queries.into(),
                client.avg_response_ms.into(),
                client.most_accessed_domain.as_str().into(),
                client.busiest_hour.as_str().into(),
            ]);
        }
        sheet
    }

    fn top_domains_sheet(domains: &[DomainCount]) -> Sheet {
        let mut sheet = Sheet::new(TOP_DOMAINS_SHEET, TOP_DOMAINS_COLUMNS);
        for entry in domains {
            sheet.push(vec![entry.domain.as_str().into(), entry.access_count.into()]);
        }
        sheet
    }

    fn time_block_sheet(blocks: &[BucketSummary]) -> Sheet {
        let mut sheet = Sheet::new(TIME_BLOCK_SHEET, TIME_BLOCK_COLUMNS);
        for block in blocks {
            sheet.push(vec![
                block.label.as_str().into(),
                block.query_count.into(),
                block.avg_response_ms.into(),
                block.top_domain.as_str().into(),
            ]);
        }
        sheet
    }

    fn raw_data_sheet(records: &[WindowedRecord]) -> Sheet {
        let mut sheet = Sheet::new(RAW_DATA_SHEET, RAW_DATA_COLUMNS);
        for record in records {
            sheet.push(vec![
                record.timestamp.format(RAW_TIMESTAMP_FORMAT).to_string().into(),
                record.client_ip.as_str().into(),
                record.domain.as_str().into(),
                record.response_ms.into(),
            ]);
        }
        sheet
    }
}
