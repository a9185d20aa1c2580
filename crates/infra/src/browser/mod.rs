//! fantoccini-backed [`BrowserDriver`](altoro_core::browser::BrowserDriver)
//! and launcher.

pub mod webdriver;

pub use webdriver::{WebDriverBrowser, WebDriverLauncher};
