//! Part 3: date-filtered recent transactions and the high-value credits.

use altoro_domain::constants::{
    HIGH_VALUE_CREDIT_THRESHOLD, SHEET_FILTERED_TRANSACTIONS, SHEET_HIGH_VALUE_CREDITS,
    TRANSACTION_DISPLAY_COLUMNS,
};
use altoro_domain::{Result, Table, Transaction};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::session::BrowserSession;
use super::WorkflowContext;
use crate::pages::TransactionsPage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsReport {
    pub transactions: Vec<Transaction>,
    pub high_value_credits: Vec<Transaction>,
}

/// Credits at or above `threshold`, largest first.
pub fn high_value_credits(transactions: &[Transaction], threshold: Decimal) -> Vec<Transaction> {
    let mut credits: Vec<Transaction> =
        transactions.iter().filter(|t| t.credit >= threshold).cloned().collect();
    credits.sort_by(|a, b| b.credit.cmp(&a.credit));
    credits
}

pub fn display_table(transactions: &[Transaction], time_format: &str) -> Table {
    let mut table = Table::with_columns(TRANSACTION_DISPLAY_COLUMNS);
    for txn in transactions {
        table.push(txn.to_display_row(time_format));
    }
    table
}

/// Writes `Filtered_Transactions` and `High_Value_Credits`.
#[instrument(skip(ctx))]
pub async fn run(ctx: &WorkflowContext) -> Result<TransactionsReport> {
    let session = BrowserSession::open(ctx).await?;
    let result = scrape(ctx, &session).await;
    session.close().await;
    let transactions = result?;

    let time_format = ctx.settings().scrape().transaction_time_format.as_str();
    let high_value = high_value_credits(&transactions, HIGH_VALUE_CREDIT_THRESHOLD);
    let sink = ctx.sink();
    sink.write_table(SHEET_FILTERED_TRANSACTIONS, &display_table(&transactions, time_format))
        .await?;
    sink.write_table(SHEET_HIGH_VALUE_CREDITS, &display_table(&high_value, time_format)).await?;
    info!(
        transactions = transactions.len(),
        high_value = high_value.len(),
        "transaction sheets written"
    );

    Ok(TransactionsReport { transactions, high_value_credits: high_value })
}

async fn scrape(ctx: &WorkflowContext, session: &BrowserSession<'_>) -> Result<Vec<Transaction>> {
    let options = ctx.settings().scrape();
    session.sign_in().await?;
    let page = TransactionsPage::new(session.actions());
    let login = session.login_page();
    let credentials = session.credentials();
    let (page, login, credentials) = (&page, &login, &credentials);
    let (start, end, time_format) =
        (options.filter_start, options.filter_end, options.transaction_time_format.as_str());
    let transactions = session
        .recovery("transactions")
        .run(
            move || async move {
                page.open_recent().await?;
                page.filter_dates(start, end).await?;
                page.read_transactions(time_format).await
            },
            move || login.recover(credentials),
        )
        .await?;
    Ok(transactions)
}
