//! Workbook output.

pub mod xlsx;

pub use xlsx::{XlsxWorkbookSink, MONEY_FORMAT};
