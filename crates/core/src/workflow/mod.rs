//! The six automation parts and the pipeline that runs them in order.
//!
//! Every part opens its own [`BrowserSession`], signs in, does its page
//! work under session recovery and writes its sheets to the
//! [`TableSink`]. Part 6 talks to the REST API instead of the browser.

pub mod accounts;
pub mod api_validation;
pub mod login;
pub mod pipeline;
pub mod products;
pub mod session;
pub mod transactions;
pub mod transfer;

use std::fmt;
use std::sync::Arc;

use altoro_domain::Settings;

use crate::bank_api::ApiTransport;
use crate::browser::BrowserLauncher;
use crate::report::TableSink;

pub use api_validation::{ApiValidation, ApiValidationReport};
pub use login::LoginReport;
pub use pipeline::{run_all, run_part, PartOutcome, PipelineReport};
pub use session::{BrowserSession, ScreenshotCapture};
pub use transactions::TransactionsReport;
pub use transfer::TransferReport;

/// Settings and adapters shared by every part.
#[derive(Clone)]
pub struct WorkflowContext {
    settings: Settings,
    launcher: Arc<dyn BrowserLauncher>,
    sink: Arc<dyn TableSink>,
    transport: Arc<dyn ApiTransport>,
}

impl WorkflowContext {
    pub fn new(
        settings: Settings,
        launcher: Arc<dyn BrowserLauncher>,
        sink: Arc<dyn TableSink>,
        transport: Arc<dyn ApiTransport>,
    ) -> Self {
        Self { settings, launcher, sink, transport }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn launcher(&self) -> &dyn BrowserLauncher {
        self.launcher.as_ref()
    }

    pub fn sink(&self) -> &dyn TableSink {
        self.sink.as_ref()
    }

    pub fn transport(&self) -> Arc<dyn ApiTransport> {
        Arc::clone(&self.transport)
    }
}

impl fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("base_url", &self.settings.site().base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Login,
    Accounts,
    Transactions,
    Transfer,
    Products,
    ApiValidation,
}

altoro_domain::impl_label_conversions!(Part {
    Login => "login",
    Accounts => "accounts",
    Transactions => "transactions",
    Transfer => "transfer",
    Products => "products",
    ApiValidation => "api-validate",
});

impl Part {
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::Accounts,
        Self::Transactions,
        Self::Transfer,
        Self::Products,
        Self::ApiValidation,
    ];

    /// 1-based position in the pipeline.
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).map_or(0, |i| i + 1)
    }
}
