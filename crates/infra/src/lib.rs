//! # Altoro Infrastructure
//!
//! Adapters behind the `altoro-core` ports:
//! - WebDriver browser sessions (fantoccini)
//! - The REST transport (reqwest)
//! - The Excel workbook sink (rust_xlsxwriter)
//! - Configuration loading and logging setup
//!
//! Everything that touches the network, the filesystem or a browser lives
//! here; `altoro-core` stays pure.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod browser;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod report;

pub use browser::{WebDriverBrowser, WebDriverLauncher};
pub use http::HttpTransport;
pub use observability::{init_logging, LogOptions};
pub use report::XlsxWorkbookSink;
