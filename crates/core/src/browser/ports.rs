//! Port interfaces for driving a browser
//!
//! The page modules only ever talk to a [`BrowserDriver`]. Infrastructure
//! supplies the WebDriver implementation; tests use
//! [`FakeBrowser`](crate::testing::FakeBrowser).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::BrowserError;

/// How an element is located.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Css(String),
    XPath(String),
    /// Anchor whose visible text equals the value.
    LinkText(String),
    /// Any element whose text contains the value.
    Text(String),
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn link(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::LinkText(s) => write!(f, "link={s}"),
            Self::Text(s) => write!(f, "text={s}"),
        }
    }
}

/// An `<option>` of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }
}

/// An anchor's text and `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

impl Link {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self { text: text.into(), href: href.into() }
    }
}

/// One open browser page.
///
/// Single-element operations act on the first match. Text is returned
/// trimmed. Queries on absent elements return empty results rather than
/// errors; actions on absent elements fail with [`BrowserError::NotFound`].
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate and wait for the DOM to load.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn go_back(&self) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn click(&self, target: &Target) -> Result<(), BrowserError>;

    /// Replace the field's content with `text`.
    async fn fill(&self, target: &Target, text: &str) -> Result<(), BrowserError>;

    /// Append keystrokes to the field without clearing it.
    async fn type_text(&self, target: &Target, text: &str) -> Result<(), BrowserError>;

    /// Select the `<option>` whose value is `value`.
    async fn select_option(&self, target: &Target, value: &str) -> Result<(), BrowserError>;

    /// Wait until the element is present and displayed.
    async fn wait_for(&self, target: &Target, timeout: Duration) -> Result<(), BrowserError>;

    async fn count(&self, target: &Target) -> Result<usize, BrowserError>;

    /// `false` when the element is absent.
    async fn is_visible(&self, target: &Target) -> Result<bool, BrowserError>;

    /// Text of the first match.
    async fn text(&self, target: &Target) -> Result<String, BrowserError>;

    /// Text of every match, in document order.
    async fn texts(&self, target: &Target) -> Result<Vec<String>, BrowserError>;

    async fn attribute(&self, target: &Target, name: &str) -> Result<Option<String>, BrowserError>;

    /// Options of the first matching `<select>`.
    async fn options(&self, target: &Target) -> Result<Vec<SelectOption>, BrowserError>;

    /// Every matching anchor.
    async fn links(&self, target: &Target) -> Result<Vec<Link>, BrowserError>;

    /// One entry per `<tr>` of the first matching table, holding the text of
    /// its `<td>` cells. Header rows made of `<th>` come back empty.
    async fn table_rows(&self, target: &Target) -> Result<Vec<Vec<String>>, BrowserError>;

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    /// End the browser session.
    async fn quit(&self) -> Result<(), BrowserError>;
}

/// Opens browser sessions. Each workflow part launches its own.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, BrowserError>;

    async fn close(&self, driver: Box<dyn BrowserDriver>) -> Result<(), BrowserError> {
        driver.quit().await
    }
}
