//! Part 5: the PERSONAL and SMALL BUSINESS product catalog.

use altoro_domain::constants::SHEET_PRODUCT_CATALOG;
use altoro_domain::{Product, Result, Table};
use tracing::{info, instrument};

use super::session::BrowserSession;
use super::WorkflowContext;
use crate::pages::ProductsPage;

const CATALOG_COLUMNS: [&str; 7] =
    ["Section", "Category", "Product Name", "Description", "Features", "Promotions", "Terms"];

pub fn catalog_table(products: &[Product]) -> Table {
    let mut table = Table::with_columns(CATALOG_COLUMNS);
    for product in products {
        table.push(product.to_row());
    }
    table
}

/// Writes `Product_Catalog`.
#[instrument(skip(ctx))]
pub async fn run(ctx: &WorkflowContext) -> Result<Vec<Product>> {
    let session = BrowserSession::open(ctx).await?;
    let result = scrape(&session).await;
    session.close().await;
    let products = result?;

    ctx.sink().write_table(SHEET_PRODUCT_CATALOG, &catalog_table(&products)).await?;
    info!(products = products.len(), "product catalog written");
    Ok(products)
}

async fn scrape(session: &BrowserSession<'_>) -> Result<Vec<Product>> {
    session.sign_in().await?;
    let page = ProductsPage::new(session.actions());
    let login = session.login_page();
    let credentials = session.credentials();
    let (page, login, credentials) = (&page, &login, &credentials);
    let products = session
        .recovery("products")
        .run(move || page.scrape_all(), move || login.recover(credentials))
        .await?;
    Ok(products)
}
