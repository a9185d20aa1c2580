//! Fully scripted [`WorkflowContext`] for workflow tests.

use std::path::Path;
use std::sync::Arc;

use altoro_domain::{RawSettings, Settings};

use super::api::{demo_api, FakeTransport};
use super::browser::{FakeBrowser, FakeLauncher};
use super::site::{bank_site, BankSite};
use crate::report::{InMemorySink, TableSink};
use crate::workflow::WorkflowContext;

/// Default settings with every output path under `dir`, short API backoff
/// and immediate session replays.
pub fn test_settings(dir: &Path) -> Settings {
    Settings::from_raw(test_raw_settings(dir)).expect("test settings are valid")
}

/// The raw form of [`test_settings`], for tests that tweak a field.
pub fn test_raw_settings(dir: &Path) -> RawSettings {
    RawSettings {
        screenshot_dir: dir.join("screenshots"),
        trace_dir: dir.join("traces"),
        excel_path: dir.join("report.xlsx"),
        log_dir: dir.join("logs"),
        api_backoff_base_ms: 10,
        api_jitter_ms: 0,
        session_recovery_delay_ms: 0,
        ..RawSettings::default()
    }
}

/// The demo bank behind fake adapters, wired into a context.
pub struct Harness {
    pub ctx: WorkflowContext,
    pub browser: FakeBrowser,
    pub launcher: FakeLauncher,
    pub transport: FakeTransport,
    pub sink: Arc<InMemorySink>,
    pub site: BankSite,
}

impl Harness {
    pub fn new(dir: &Path) -> Self {
        Self::with_settings(test_settings(dir))
    }

    pub fn with_settings(settings: Settings) -> Self {
        let browser = FakeBrowser::new();
        let site = bank_site(&browser);
        let launcher = FakeLauncher::new(browser.clone());
        let transport = FakeTransport::new();
        demo_api(&transport);
        let sink = Arc::new(InMemorySink::new());
        let ctx = WorkflowContext::new(
            settings,
            Arc::new(launcher.clone()),
            Arc::clone(&sink) as Arc<dyn TableSink>,
            Arc::new(transport.clone()),
        );
        Self { ctx, browser, launcher, transport, sink, site }
    }
}
