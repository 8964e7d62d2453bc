//! Spreadsheet output
//!
//! Writes a [`ReportWorkbook`] as an `.xlsx` file, one worksheet per sheet
//! with a bold header row.

use crate::error::{AnalysisError, AnalysisResult};
use crate::report::{Cell, ReportWorkbook};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Rows per worksheet in the xlsx format, header included.
const XLSX_MAX_ROWS: usize = 1_048_576;

pub struct XlsxWriter;

impl XlsxWriter {
    /// Write `report` into `output_dir` under its own file name and return
    /// the full path.
    pub fn write(report: &ReportWorkbook, output_dir: &Path) -> AnalysisResult<PathBuf> {
        let path = output_dir.join(&report.file_name);
        let write_error = |message: String| AnalysisError::ReportWrite {
            path: path.clone(),
            message,
        };

        Self::check_row_limit(report, XLSX_MAX_ROWS).map_err(write_error)?;
        fs::create_dir_all(output_dir).map_err(|e| write_error(e.to_string()))?;
        Self::build(report)
            .and_then(|mut workbook| workbook.save(&path))
            .map_err(|e| write_error(e.to_string()))?;

        info!(
            path = %path.display(),
            sheets = report.sheets.len(),
            "Report written"
        );

        Ok(path)
    }

    /// Refuse a sheet whose header plus data rows exceed `max_rows`.
    fn check_row_limit(report: &ReportWorkbook, max_rows: usize) -> Result<(), String> {
        let data_limit = max_rows.saturating_sub(1);
        match report.sheets.iter().find(|sheet| sheet.rows.len() > data_limit) {
            Some(sheet) => Err(format!(
                "sheet {} has {} rows, xlsx allows at most {} data rows",
                sheet.name,
                sheet.rows.len(),
                data_limit
            )),
            None => Ok(()),
        }
    }

    fn build(report: &ReportWorkbook) -> Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for sheet in &report.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name)?;

            for (col, column) in sheet.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, *column, &header)?;
            }

            for (i, row) in sheet.rows.iter().enumerate() {
                let row_num = (i + 1) as u32;
                for (col, cell) in row.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Cell::Text(text) => worksheet.write_string(row_num, col, text)?,
                        Cell::Count(count) => worksheet.write_number(row_num, col, *count as f64)?,
                        Cell::Number(number) => worksheet.write_number(row_num, col, *number)?,
                    };
                }
            }

            worksheet.autofit();
        }

        Ok(workbook)
    }
}
