//! WebDriver implementation of the browser ports via fantoccini.

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use altoro_core::browser::{
    BrowserDriver, BrowserError, BrowserLauncher, Link, SelectOption, Target,
};
use altoro_domain::Settings;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::{io_error, launch_error, webdriver_error};

/// How often `wait_for` re-queries the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const WINDOW_SIZE: &str = "1920,1080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Css,
    XPath,
    LinkText,
}

/// A [`Target`] in the form WebDriver locates by. Text targets become an
/// XPath matching the innermost element containing the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector<'a> {
    kind: Kind,
    value: Cow<'a, str>,
}

impl<'a> Selector<'a> {
    fn new(target: &'a Target) -> Self {
        match target {
            Target::Css(s) => Self { kind: Kind::Css, value: Cow::Borrowed(s) },
            Target::XPath(s) => Self { kind: Kind::XPath, value: Cow::Borrowed(s) },
            Target::LinkText(s) => Self { kind: Kind::LinkText, value: Cow::Borrowed(s) },
            Target::Text(s) => {
                let literal = xpath_literal(s);
                let contains = format!("contains(normalize-space(.), {literal})");
                Self {
                    kind: Kind::XPath,
                    value: Cow::Owned(format!("//*[{contains}][not(*[{contains}])]")),
                }
            }
        }
    }

    fn locator(&self) -> Locator<'_> {
        match self.kind {
            Kind::Css => Locator::Css(&self.value),
            Kind::XPath => Locator::XPath(&self.value),
            Kind::LinkText => Locator::LinkText(&self.value),
        }
    }
}

/// Quote `text` as an XPath string literal.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// One WebDriver session.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn find_all(&self, target: &Target) -> Result<Vec<Element>, BrowserError> {
        let selector = Selector::new(target);
        self.client
            .find_all(selector.locator())
            .await
            .map_err(|e| webdriver_error(e, &target.to_string()))
    }

    async fn first(&self, target: &Target) -> Result<Option<Element>, BrowserError> {
        Ok(self.find_all(target).await?.into_iter().next())
    }

    async fn require(&self, target: &Target) -> Result<Element, BrowserError> {
        self.first(target).await?.ok_or_else(|| BrowserError::NotFound(target.to_string()))
    }

    async fn any_displayed(&self, target: &Target) -> Result<bool, BrowserError> {
        for element in self.find_all(target).await? {
            if element.is_displayed().await.map_err(|e| webdriver_error(e, &target.to_string()))? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

async fn element_text(element: &Element, target: &Target) -> Result<String, BrowserError> {
    element
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| webdriver_error(e, &target.to_string()))
}

async fn element_attr(
    element: &Element,
    name: &str,
    target: &Target,
) -> Result<Option<String>, BrowserError> {
    element.attr(name).await.map_err(|e| webdriver_error(e, &target.to_string()))
}

async fn child_texts(
    element: &Element,
    css: &str,
    target: &Target,
) -> Result<Vec<String>, BrowserError> {
    let children = element
        .find_all(Locator::Css(css))
        .await
        .map_err(|e| webdriver_error(e, &target.to_string()))?;
    let mut texts = Vec::with_capacity(children.len());
    for child in &children {
        texts.push(element_text(child, target).await?);
    }
    Ok(texts)
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url, "navigating");
        self.client.goto(url).await.map_err(|e| webdriver_error(e, url))
    }

    async fn go_back(&self) -> Result<(), BrowserError> {
        self.client.back().await.map_err(|e| webdriver_error(e, "back"))
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| webdriver_error(e, "current url"))
    }

    async fn click(&self, target: &Target) -> Result<(), BrowserError> {
        let element = self.require(target).await?;
        element.click().await.map_err(|e| webdriver_error(e, &target.to_string()))
    }

    async fn fill(&self, target: &Target, text: &str) -> Result<(), BrowserError> {
        let element = self.require(target).await?;
        element.clear().await.map_err(|e| webdriver_error(e, &target.to_string()))?;
        element.send_keys(text).await.map_err(|e| webdriver_error(e, &target.to_string()))
    }

    async fn type_text(&self, target: &Target, text: &str) -> Result<(), BrowserError> {
        let element = self.require(target).await?;
        element.send_keys(text).await.map_err(|e| webdriver_error(e, &target.to_string()))
    }

    async fn select_option(&self, target: &Target, value: &str) -> Result<(), BrowserError> {
        let element = self.require(target).await?;
        element
            .select_by_value(value)
            .await
            .map_err(|e| webdriver_error(e, &format!("{target} option {value}")))
    }

    async fn wait_for(&self, target: &Target, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.any_displayed(target).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(target, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn count(&self, target: &Target) -> Result<usize, BrowserError> {
        Ok(self.find_all(target).await?.len())
    }

    async fn is_visible(&self, target: &Target) -> Result<bool, BrowserError> {
        match self.first(target).await? {
            Some(element) => {
                element.is_displayed().await.map_err(|e| webdriver_error(e, &target.to_string()))
            }
            None => Ok(false),
        }
    }

    async fn text(&self, target: &Target) -> Result<String, BrowserError> {
        match self.first(target).await? {
            Some(element) => element_text(&element, target).await,
            None => Ok(String::new()),
        }
    }

    async fn texts(&self, target: &Target) -> Result<Vec<String>, BrowserError> {
        let elements = self.find_all(target).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            texts.push(element_text(element, target).await?);
        }
        Ok(texts)
    }

    async fn attribute(&self, target: &Target, name: &str) -> Result<Option<String>, BrowserError> {
        match self.first(target).await? {
            Some(element) => element_attr(&element, name, target).await,
            None => Ok(None),
        }
    }

    async fn options(&self, target: &Target) -> Result<Vec<SelectOption>, BrowserError> {
        let Some(select) = self.first(target).await? else { return Ok(Vec::new()) };
        let items = select
            .find_all(Locator::Css("option"))
            .await
            .map_err(|e| webdriver_error(e, &target.to_string()))?;
        let mut options = Vec::with_capacity(items.len());
        for item in &items {
            let value = element_attr(item, "value", target).await?.unwrap_or_default();
            options.push(SelectOption::new(value, element_text(item, target).await?));
        }
        Ok(options)
    }

    async fn links(&self, target: &Target) -> Result<Vec<Link>, BrowserError> {
        let anchors = self.find_all(target).await?;
        let mut links = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            let href = element_attr(anchor, "href", target).await?.unwrap_or_default();
            links.push(Link::new(element_text(anchor, target).await?, href));
        }
        Ok(links)
    }

    async fn table_rows(&self, target: &Target) -> Result<Vec<Vec<String>>, BrowserError> {
        let Some(table) = self.first(target).await? else { return Ok(Vec::new()) };
        let rows = table
            .find_all(Locator::Css("tr"))
            .await
            .map_err(|e| webdriver_error(e, &target.to_string()))?;
        let mut cells = Vec::with_capacity(rows.len());
        for row in &rows {
            cells.push(child_texts(row, "td", target).await?);
        }
        Ok(cells)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let png = self.client.screenshot().await.map_err(|e| webdriver_error(e, "screenshot"))?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| io_error(&e, dir))?;
        }
        tokio::fs::write(path, png).await.map_err(|e| io_error(&e, path))?;
        debug!(path = %path.display(), "screenshot saved");
        Ok(())
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        self.client.clone().close().await.map_err(|e| webdriver_error(e, "close session"))
    }
}

/// Opens a fresh WebDriver session per workflow part.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: Url,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: Url, headless: bool) -> Self {
        Self { webdriver_url, headless }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let browser = settings.browser();
        Self::new(browser.webdriver_url.clone(), browser.headless)
    }

    /// Chrome and Firefox options; the driver ignores the other vendor's.
    fn capabilities(&self) -> Capabilities {
        let mut chrome_args =
            vec![format!("--window-size={WINDOW_SIZE}"), "--disable-gpu".to_string()];
        let mut firefox_args = Vec::new();
        if self.headless {
            chrome_args.push("--headless=new".to_string());
            firefox_args.push("-headless".to_string());
        }
        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
        caps.insert("moz:firefoxOptions".to_string(), json!({ "args": firefox_args }));
        caps
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    #[instrument(skip(self), fields(webdriver = %self.webdriver_url, headless = self.headless))]
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>, BrowserError> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(self.webdriver_url.as_str())
            .await
            .map_err(launch_error)?;
        info!("browser session started");
        Ok(Box::new(WebDriverBrowser::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("Sign Off"), "'Sign Off'");
        assert_eq!(xpath_literal("We're sorry"), "\"We're sorry\"");
        assert_eq!(xpath_literal(r#"it's "x""#), r#"concat('it', "'", 's "x"')"#);
    }

    #[test]
    fn test_text_target_matches_innermost_element() {
        let target = Target::text("Sign Off");
        let selector = Selector::new(&target);
        assert_eq!(selector.kind, Kind::XPath);
        assert_eq!(
            selector.value,
            "//*[contains(normalize-space(.), 'Sign Off')][not(*[contains(normalize-space(.), 'Sign Off')])]"
        );
    }

    #[test]
    fn test_css_and_link_targets_pass_through() {
        let css = Target::css("#listAccounts");
        assert_eq!(
            Selector::new(&css),
            Selector { kind: Kind::Css, value: Cow::Borrowed("#listAccounts") }
        );
        let link = Target::link("PERSONAL");
        assert_eq!(Selector::new(&link).kind, Kind::LinkText);
    }

    #[test]
    fn test_headless_flag_reaches_both_vendors() {
        let url = Url::parse("http://localhost:4444").expect("url");
        let caps = WebDriverLauncher::new(url.clone(), true).capabilities();
        assert!(caps["goog:chromeOptions"]["args"]
            .as_array()
            .is_some_and(|a| a.contains(&json!("--headless=new"))));
        assert_eq!(caps["moz:firefoxOptions"]["args"], json!(["-headless"]));

        let headed = WebDriverLauncher::new(url, false).capabilities();
        assert_eq!(headed["moz:firefoxOptions"]["args"], json!([]));
    }
}
