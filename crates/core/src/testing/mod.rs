//! Test doubles for the browser and API ports, and a scripted harness
//! wiring them into a workflow context.

pub mod api;
pub mod browser;
pub mod harness;
pub mod site;

use std::time::Duration;

use altoro_domain::config::HumanizeSettings;

pub use api::{demo_api, FakeRequest, FakeTransport};
pub use browser::{FakeBrowser, FakeCall, FakeLauncher, FakePage};
pub use harness::{test_raw_settings, test_settings, Harness};
pub use site::{bank_site, BankSite};

/// Humanization off, all delays zero.
pub fn no_humanize() -> HumanizeSettings {
    HumanizeSettings {
        enabled: false,
        min_action_delay: Duration::ZERO,
        max_action_delay: Duration::ZERO,
        typing_speed: Duration::ZERO,
    }
}
