//! # Altoro Core
//!
//! Automation logic for the Altoro Mutual demo bank, free of concrete
//! browser, HTTP and spreadsheet code.
//!
//! This crate contains:
//! - Ports for the browser ([`browser`]), the REST API ([`bank_api`]) and
//!   result sheets ([`report`])
//! - Page objects driving the site ([`pages`])
//! - The reconciliation engine ([`reconciliation`])
//! - The six automation parts and the pipeline ([`workflow`])
//!
//! ## Architecture Principles
//! - Depends on `altoro-common` and `altoro-domain` only
//! - Adapters live in `altoro-infra` and are injected through
//!   [`workflow::WorkflowContext`]

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod bank_api;
pub mod browser;
pub mod error;
pub mod pages;
pub mod reconciliation;
pub mod report;
pub mod workflow;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use bank_api::{AltoroApi, ApiError, ApiTransport};
pub use browser::{BrowserDriver, BrowserError, BrowserLauncher};
pub use reconciliation::{reconcile, MatchStatus, ReconciliationReport};
pub use report::TableSink;
pub use workflow::{run_all, run_part, Part, PipelineReport, WorkflowContext};
