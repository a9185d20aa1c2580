//! Conversions from external adapter errors into the port error types.
//!
//! The port errors live in `altoro-core` and the source errors in
//! third-party crates, so these are plain functions rather than `From`
//! impls.

use std::path::Path;
use std::time::Duration;

use altoro_core::bank_api::ApiError;
use altoro_core::browser::BrowserError;
use altoro_domain::AltoroError;
use fantoccini::error::{CmdError, NewSessionError};
use rust_xlsxwriter::XlsxError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

/// Timeouts keep the configured limit; connection and request failures are
/// network errors; body decoding failures are decode errors.
pub fn http_error(err: &reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout)
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        ApiError::from_status(status.as_u16(), &err.to_string(), None)
    } else {
        ApiError::Network(err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* fantoccini errors → BrowserError */
/* -------------------------------------------------------------------------- */

/// `target` names what the command acted on, for messages.
pub fn webdriver_error(err: CmdError, target: &str) -> BrowserError {
    match err {
        e if e.is_no_such_element() => BrowserError::NotFound(target.to_string()),
        CmdError::Lost(e) => BrowserError::SessionLost(e.to_string()),
        other => BrowserError::Command(format!("{target}: {other}")),
    }
}

pub fn launch_error(err: NewSessionError) -> BrowserError {
    BrowserError::Launch(err.to_string())
}

pub fn io_error(err: &std::io::Error, path: &Path) -> BrowserError {
    BrowserError::Io { path: path.to_path_buf(), message: err.to_string() }
}

/* -------------------------------------------------------------------------- */
/* rust_xlsxwriter::XlsxError → AltoroError */
/* -------------------------------------------------------------------------- */

pub fn workbook_error(err: &XlsxError, path: &Path) -> AltoroError {
    AltoroError::Spreadsheet(format!("{}: {err}", path.display()))
}
