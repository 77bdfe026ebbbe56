// Excel file import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import: cell values only. Formulas, styles and merges are ignored; the
// loaders only need what the marketplace wrote into each cell.
// Export: the six-sheet action report. A fresh workbook is built per call and
//         serialized to memory, so nothing is shared between runs.

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Instant;

use adsgrid_recon::coerce::from_excel_serial;
use adsgrid_recon::model::{Cell, ReportResult, SheetData, Tabular, WorkbookData};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook, Worksheet};

/// Hard cap on rows read per sheet. Marketplace exports stay far below it.
pub const MAX_ROWS: usize = 1_048_576;

/// Sheet names of the exported report, in workbook order.
pub const REPORT_SHEETS: [&str; 6] = [
    "Summary",
    "Pause-Campaigns",
    "Promote-to-Ads",
    "Scale-Budget",
    "Raise-Acos-Target",
    "Campaign-Base",
];

/// Statistics from an import operation
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    pub sheets_imported: usize,
    pub cells_imported: usize,
    pub dates_imported: usize,
    pub errors_as_text: usize,
    pub import_duration_ms: u128,
}

impl ImportStats {
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} sheet{}", self.sheets_imported, if self.sheets_imported == 1 { "" } else { "s" }),
            format!("{} cells", self.cells_imported),
        ];
        if self.errors_as_text > 0 {
            parts.push(format!("{} error cells", self.errors_as_text));
        }
        parts.join(" · ")
    }
}

// ============================================================================
// Import
// ============================================================================

/// Import every sheet of a workbook file.
pub fn import(path: &Path) -> Result<(WorkbookData, ImportStats), String> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;
    read_sheets(&mut workbook)
}

/// Import a workbook held in memory (an upload, a test fixture).
pub fn import_bytes(bytes: &[u8]) -> Result<(WorkbookData, ImportStats), String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open Excel data: {}", e))?;
    read_sheets(&mut workbook)
}

fn read_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<(WorkbookData, ImportStats), String> {
    let start_time = Instant::now();
    let mut stats = ImportStats::default();
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        // Range start offset (data may not begin at A1). Pad so row and
        // column indices stay absolute.
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];

        for row in range.rows() {
            if rows.len() >= MAX_ROWS {
                log::warn!("sheet '{}' truncated at {} rows", sheet_name, MAX_ROWS);
                break;
            }
            let mut cells = vec![Cell::Empty; start_col as usize];
            for value in row {
                let cell = convert(value, &mut stats);
                if !cell.is_empty() {
                    stats.cells_imported += 1;
                }
                cells.push(cell);
            }
            rows.push(cells);
        }

        log::debug!("sheet '{}': {} row(s)", sheet_name, rows.len());
        sheets.push(SheetData::new(sheet_name.as_str(), rows));
        stats.sheets_imported += 1;
    }

    stats.import_duration_ms = start_time.elapsed().as_millis();
    Ok((WorkbookData::new(sheets), stats))
}

fn convert(value: &Data, stats: &mut ImportStats) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => {
            stats.errors_as_text += 1;
            Cell::Text(format!("#{:?}", e))
        }
        Data::DateTime(dt) => {
            // Assumes the 1900 date system (calamine does not expose the
            // 1904 flag here).
            match from_excel_serial(dt.as_f64()) {
                Some(date) => {
                    stats.dates_imported += 1;
                    Cell::Date(date)
                }
                None => Cell::Number(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ============================================================================
// Export
// ============================================================================

/// Render the report as an xlsx file in memory.
pub fn export_report(result: &ReportResult) -> Result<Vec<u8>, String> {
    let mut workbook = XlsxWorkbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");

    let [summary, pause, promote, scale, raise_acos, base] = REPORT_SHEETS;
    write_table(&mut workbook, summary, std::slice::from_ref(&result.kpis), &header, &date)?;
    write_table(&mut workbook, pause, &result.pause, &header, &date)?;
    write_table(&mut workbook, promote, &result.promote, &header, &date)?;
    write_table(&mut workbook, scale, &result.scale, &header, &date)?;
    write_table(&mut workbook, raise_acos, &result.raise_acos, &header, &date)?;
    write_table(&mut workbook, base, &result.campaigns, &header, &date)?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to serialize XLSX report: {}", e))
}

fn write_table<T: Tabular>(
    workbook: &mut XlsxWorkbook,
    name: &str,
    rows: &[T],
    header: &Format,
    date: &Format,
) -> Result<(), String> {
    let worksheet = workbook
        .add_worksheet()
        .set_name(name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", name, e))?;

    for (col, title) in T::columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *title, header)
            .map_err(|e| format!("Failed to write header '{}': {}", title, e))?;
    }

    for (idx, record) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in record.cells().iter().enumerate() {
            write_cell(worksheet, row, col as u16, cell, date)
                .map_err(|e| format!("Failed to write {}!({}, {}): {}", name, row, col, e))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header of '{}': {}", name, e))?;
    worksheet.autofit();
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    match cell {
        // Missing values stay blank.
        Cell::Empty => {}
        Cell::Number(n) if !n.is_finite() => {}
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Date(d) => {
            let dt = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
            worksheet.write_datetime_with_format(row, col, &dt, date)?;
        }
    }
    Ok(())
}
