//! Sheet naming rules and section stacking.

use altoro_domain::{AltoroError, Result, Row, Table};

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Column carrying section titles in a stacked sheet.
pub const SECTION_COLUMN: &str = "SECTION";

/// # Errors
/// `AltoroError::Spreadsheet` for blank names, names over 31 characters,
/// names with `[ ] : * ? / \`, or names wrapped in apostrophes.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("is blank")
    } else if name.chars().count() > MAX_SHEET_NAME {
        Some("is longer than 31 characters")
    } else if name.contains(FORBIDDEN) {
        Some("contains one of [ ] : * ? / \\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("starts or ends with an apostrophe")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(AltoroError::Spreadsheet(format!("sheet name '{name}' {problem}"))),
        None => Ok(()),
    }
}

/// Stack titled sections into one table: a title row, the section's rows,
/// then a blank separator row. Empty sections are left out unless
/// `keep_empty` is set.
pub fn stack_sections(sections: Vec<(&str, Table)>, keep_empty: bool) -> Table {
    let mut stacked = Table::with_columns([SECTION_COLUMN]);
    for (title, table) in sections {
        if table.is_empty() && !keep_empty {
            continue;
        }
        stacked.push(Row::new().with(SECTION_COLUMN, title));
        stacked.append(table);
        stacked.push(Row::new());
    }
    stacked
}
