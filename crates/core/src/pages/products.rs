//! PERSONAL / SMALL BUSINESS product catalog pages.

use altoro_domain::{Product, Section};
use tracing::{debug, info};

use crate::browser::{BrowserError, Link, PageActions, Target};

pub const CATEGORY_LINKS: &str = "h2 a";
pub const CATEGORY_HEADING: &str = "h1";
pub const PARAGRAPHS: &str = "p";
/// Items of the first list inside a `.fl` column.
pub const PRODUCT_ITEMS: &str = "(//*[contains(concat(' ', normalize-space(@class), ' '), ' fl ')]//ul)[1]/li";

const PROMO_KEYWORDS: [&str; 5] = ["bonus", "offer", "promotion", "special", "limited time"];
const TERMS_PREFIXES: [&str; 4] = ["note:", "terms:", "conditions:", "disclaimer:"];
const NOT_DESCRIPTION: [&str; 6] =
    ["bonus", "offer", "note:", "terms:", "for more information", "last updated on"];

/// Target for the `h2` link whose text contains `name`.
pub fn category_target(name: &str) -> Target {
    Target::xpath(format!("//h2//a[contains(normalize-space(.), {})]", xpath_literal(name)))
}

fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Paragraphs with a dollar amount or promo wording, joined with ` | `.
pub fn promotions(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            p.contains('$') || PROMO_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Paragraphs opening with a terms prefix, joined with ` | `.
pub fn terms(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            TERMS_PREFIXES.iter().any(|k| lower.starts_with(k))
        })
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// The last paragraph that is not promo, terms or footer text.
pub fn description(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .rev()
        .find(|p| {
            let lower = p.to_lowercase();
            !p.is_empty() && !NOT_DESCRIPTION.iter().any(|k| lower.contains(k))
        })
        .cloned()
        .unwrap_or_default()
}

pub struct ProductsPage<'a> {
    actions: PageActions<'a>,
}

impl<'a> ProductsPage<'a> {
    pub fn new(actions: PageActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn open_section(&self, section: Section) -> Result<(), BrowserError> {
        self.actions.click_if_present(&Target::link(section.label())).await?;
        Ok(())
    }

    /// `h2 a` links with both text and href.
    pub async fn category_links(&self) -> Result<Vec<Link>, BrowserError> {
        let links = self.actions.driver().links(&Target::css(CATEGORY_LINKS)).await?;
        Ok(links
            .into_iter()
            .map(|l| Link::new(l.text.trim(), l.href.trim()))
            .filter(|l| !l.text.is_empty() && !l.href.is_empty())
            .collect())
    }

    pub async fn open_category(&self, name: &str) -> Result<(), BrowserError> {
        self.actions.click_if_present(&category_target(name)).await?;
        Ok(())
    }

    /// One product per list item on the open category page.
    pub async fn extract_category(
        &self,
        section: Section,
        expected: &str,
    ) -> Result<Vec<Product>, BrowserError> {
        let driver = self.actions.driver();
        let heading = Target::css(CATEGORY_HEADING);
        let category = if driver.count(&heading).await? > 0 {
            driver.text(&heading).await?.trim().to_string()
        } else {
            expected.to_string()
        };
        let paragraphs: Vec<String> = driver
            .texts(&Target::css(PARAGRAPHS))
            .await?
            .into_iter()
            .map(|p| p.trim().to_string())
            .collect();
        let description = description(&paragraphs);
        let promotions = promotions(&paragraphs);
        let terms = terms(&paragraphs);

        let items = driver.texts(&Target::xpath(PRODUCT_ITEMS)).await?;
        Ok(items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .map(|product_name| Product {
                section,
                category: category.clone(),
                product_name,
                description: description.clone(),
                features: description.clone(),
                promotions: promotions.clone(),
                terms: terms.clone(),
            })
            .collect())
    }

    /// Every category of every section, returning to the landing page after
    /// each one.
    pub async fn scrape_all(&self) -> Result<Vec<Product>, BrowserError> {
        let mut products = Vec::new();
        for section in Section::ALL {
            self.open_section(section).await?;
            let links = self.category_links().await?;
            info!(section = %section, categories = links.len(), "scanning section");
            for link in links {
                self.open_category(&link.text).await?;
                let found = self.extract_category(section, &link.text).await?;
                debug!(
                    section = %section,
                    category = %link.text,
                    products = found.len(),
                    "category scraped"
                );
                products.extend(found);
                self.actions.driver().go_back().await?;
            }
        }
        info!(products = products.len(), "product extraction complete");
        Ok(products)
    }
}
