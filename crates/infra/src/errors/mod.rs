//! Mapping adapter errors onto the port error types.

pub mod conversions;

pub use conversions::{http_error, io_error, launch_error, webdriver_error, workbook_error};
