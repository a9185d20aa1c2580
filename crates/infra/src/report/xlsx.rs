//! Excel workbook sink.
//!
//! rust_xlsxwriter only writes whole files, so the sink keeps every sheet
//! in memory and rewrites the workbook after each `write_table`. Sheets stay
//! in first-written order.

use std::path::{Path, PathBuf};

use altoro_core::report::{validate_sheet_name, TableSink, SECTION_COLUMN};
use altoro_domain::{AltoroError, CellValue, Result, Table};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{debug, info, instrument};

use crate::errors::workbook_error;

pub const MONEY_FORMAT: &str = "#,##0.00;(#,##0.00)";
const MIN_COLUMN_WIDTH: usize = 14;
const MAX_COLUMN_WIDTH: usize = 75;
const HEADER_FILL: u32 = 0x1F_4E78;

/// Header keywords of columns holding amounts.
const MONEY_KEYWORDS: [&str; 7] =
    ["amount", "balance", "total", "credit", "debit", "variance", "net"];

pub fn is_money_column(header: &str) -> bool {
    let lower = header.to_lowercase();
    MONEY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Widest rendering of each column plus padding, clamped to 14..=75.
pub fn column_widths(table: &Table) -> Vec<usize> {
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in table.grid() {
        for (width, cell) in widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.to_string().chars().count());
        }
    }
    widths.into_iter().map(|w| (w + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)).collect()
}

struct Formats {
    header: Format,
    money: Format,
    section: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_border(FormatBorder::Thin),
            money: Format::new().set_num_format(MONEY_FORMAT),
            section: Format::new().set_bold(),
        }
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    (row, col): (u32, u16),
    cell: &CellValue,
    money_column: bool,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    match cell {
        CellValue::Text(s) => sheet.write_string(row, col, s).map(|_| ()),
        CellValue::Money(d) => {
            let amount = d.to_f64().unwrap_or_default();
            sheet.write_number_with_format(row, col, amount, &formats.money).map(|_| ())
        }
        CellValue::Number(n) if money_column => {
            sheet.write_number_with_format(row, col, *n, &formats.money).map(|_| ())
        }
        CellValue::Number(n) => sheet.write_number(row, col, *n).map(|_| ()),
        CellValue::Integer(i) => sheet.write_number(row, col, *i as f64).map(|_| ()),
        CellValue::Bool(b) => sheet.write_boolean(row, col, *b).map(|_| ()),
        CellValue::Empty => Ok(()),
    }
}

fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    table: &Table,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    let columns = table.columns();
    let money: Vec<bool> = columns.iter().map(|c| is_money_column(c)).collect();
    for (col, header) in (0u16..).zip(columns) {
        sheet.write_string_with_format(0, col, header, &formats.header)?;
    }
    for (row, cells) in (1u32..).zip(table.grid()) {
        // Title rows of stacked sections carry only the section cell.
        let title = cells.iter().filter(|c| !c.is_empty()).count() == 1
            && columns.first().is_some_and(|c| c == SECTION_COLUMN)
            && !cells[0].is_empty();
        for (col, cell) in (0u16..).zip(&cells) {
            if title {
                sheet.write_string_with_format(row, col, cell.to_string(), &formats.section)?;
                break;
            }
            write_cell(sheet, (row, col), cell, money[usize::from(col)], formats)?;
        }
    }
    for (col, width) in (0u16..).zip(column_widths(table)) {
        sheet.set_column_width(col, width as f64)?;
    }
    if !columns.is_empty() {
        sheet.set_freeze_panes(1, 0)?;
        let last_row = u32::try_from(table.len()).unwrap_or(u32::MAX);
        let last_col = u16::try_from(columns.len() - 1).unwrap_or(u16::MAX);
        sheet.autofilter(0, 0, last_row, last_col)?;
    }
    Ok(())
}

fn save_workbook(path: &Path, sheets: &[(String, Table)]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| {
                AltoroError::Spreadsheet(format!("cannot create {}: {e}", dir.display()))
            })?;
    }
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    for (name, table) in sheets {
        write_sheet(&mut workbook, name, table, &formats).map_err(|e| workbook_error(&e, path))?;
    }
    workbook.save(path).map_err(|e| workbook_error(&e, path))
}

/// [`TableSink`] writing one `.xlsx` file.
pub struct XlsxWorkbookSink {
    path: PathBuf,
    sheets: Mutex<Vec<(String, Table)>>,
    /// Serialises file rewrites so a later snapshot never lands first.
    save_lock: tokio::sync::Mutex<()>,
}

impl XlsxWorkbookSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: Mutex::new(Vec::new()),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TableSink for XlsxWorkbookSink {
    #[instrument(skip(self, table), fields(rows = table.len(), path = %self.path.display()))]
    async fn write_table(&self, sheet: &str, table: &Table) -> Result<()> {
        validate_sheet_name(sheet)?;
        let _guard = self.save_lock.lock().await;
        let snapshot = {
            let mut sheets = self.sheets.lock();
            match sheets.iter_mut().find(|(name, _)| name == sheet) {
                Some((_, existing)) => *existing = table.clone(),
                None => sheets.push((sheet.to_string(), table.clone())),
            }
            sheets.clone()
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_workbook(&path, &snapshot))
            .await
            .map_err(|e| AltoroError::Internal(format!("workbook writer panicked: {e}")))??;
        info!(sheet, "sheet written");
        Ok(())
    }

    async fn read_table(&self, sheet: &str) -> Result<Option<Table>> {
        let found =
            self.sheets.lock().iter().find(|(name, _)| name == sheet).map(|(_, t)| t.clone());
        debug!(sheet, found = found.is_some(), "sheet read back");
        Ok(found)
    }

    async fn sheet_names(&self) -> Vec<String> {
        self.sheets.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use altoro_domain::Row;
    use rust_decimal_macros::dec;

    use super::*;

    fn summary() -> Table {
        Table::from_rows([
            Row::new().with("Account ID/Number", "800002").with("Total Balance", dec!(10000.00)),
            Row::new().with("Account ID/Number", "800003").with("Total Balance", dec!(-12.50)),
        ])
    }

    #[test]
    fn test_money_columns_by_header() {
        assert!(is_money_column("Total Balance"));
        assert!(is_money_column("balance_variance"));
        assert!(is_money_column("Credit"));
        assert!(!is_money_column("Account ID/Number"));
        assert!(!is_money_column("Transaction Time"));
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let table = Table::from_rows([
            Row::new().with("id", "1").with("Description", "x".repeat(120)),
        ]);
        assert_eq!(column_widths(&table), [14, 75]);
    }

    #[tokio::test]
    async fn test_writes_workbook_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("outputs/Altoro_Report.xlsx");
        let sink = XlsxWorkbookSink::new(&path);

        sink.write_table("Account_Summary", &summary()).await.expect("write");
        sink.write_table("Product_Catalog", &Table::new()).await.expect("write empty");

        assert!(path.is_file());
        assert!(std::fs::metadata(&path).map(|m| m.len()).unwrap_or_default() > 0);
        assert_eq!(sink.sheet_names().await, ["Account_Summary", "Product_Catalog"]);
        assert_eq!(sink.read_table("Account_Summary").await.expect("read"), Some(summary()));
        assert_eq!(sink.read_table("Missing").await.expect("read"), None);
    }

    #[tokio::test]
    async fn test_rewriting_a_sheet_keeps_its_position() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = XlsxWorkbookSink::new(dir.path().join("report.xlsx"));

        sink.write_table("Account_Summary", &summary()).await.expect("write");
        sink.write_table("Transfer_Details", &summary()).await.expect("write");
        sink.write_table("Account_Summary", &Table::new()).await.expect("rewrite");

        assert_eq!(sink.sheet_names().await, ["Account_Summary", "Transfer_Details"]);
        assert_eq!(sink.read_table("Account_Summary").await.expect("read"), Some(Table::new()));
    }

    #[tokio::test]
    async fn test_invalid_sheet_name_is_rejected_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.xlsx");
        let sink = XlsxWorkbookSink::new(&path);

        let err = sink.write_table("Account/Summary", &summary()).await.expect_err("slash");

        assert!(matches!(err, AltoroError::Spreadsheet(_)));
        assert!(!path.exists());
        assert!(sink.sheet_names().await.is_empty());
    }
}
