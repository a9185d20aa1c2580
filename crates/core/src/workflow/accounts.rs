//! Part 2: balances and history for every account.

use altoro_domain::constants::{
    ACCOUNT_SUMMARY_COLUMNS, SHEET_ACCOUNT_SUMMARY, SHEET_TRANSACTIONS_PREFIX,
};
use altoro_domain::{Account, AccountActivity, Result, Table};
use tracing::{info, instrument};

use super::session::BrowserSession;
use super::WorkflowContext;
use crate::pages::{AccountsPage, AccountsSnapshot};

const HISTORY_COLUMNS: [&str; 4] =
    ["Transaction Date", "Transaction Description", "Credit Amount", "Debit Amount"];

pub fn summary_table(accounts: &[Account]) -> Table {
    let mut table = Table::with_columns(ACCOUNT_SUMMARY_COLUMNS);
    for account in accounts {
        table.push(account.to_summary_row());
    }
    table
}

pub fn history_table(activity: &[AccountActivity]) -> Table {
    let mut table = Table::with_columns(HISTORY_COLUMNS);
    for record in activity {
        table.push(record.to_row());
    }
    table
}

/// Writes `Account_Summary` and one `Transactions_<id>` sheet per account
/// with history.
#[instrument(skip(ctx))]
pub async fn run(ctx: &WorkflowContext) -> Result<AccountsSnapshot> {
    let session = BrowserSession::open(ctx).await?;
    let result = scrape(&session).await;
    session.close().await;
    let snapshot = result?;

    let sink = ctx.sink();
    sink.write_table(SHEET_ACCOUNT_SUMMARY, &summary_table(&snapshot.accounts)).await?;
    for (account_id, activity) in snapshot.activity.iter().filter(|(_, a)| !a.is_empty()) {
        let sheet = format!("{SHEET_TRANSACTIONS_PREFIX}{account_id}");
        sink.write_table(&sheet, &history_table(activity)).await?;
    }
    info!(accounts = snapshot.accounts.len(), "account summary written");
    Ok(snapshot)
}

async fn scrape(session: &BrowserSession<'_>) -> Result<AccountsSnapshot> {
    session.sign_in().await?;
    let page = AccountsPage::new(session.actions());
    let login = session.login_page();
    let credentials = session.credentials();
    let (page, login, credentials) = (&page, &login, &credentials);
    let snapshot = session
        .recovery("accounts")
        .run(
            move || async move {
                page.open().await?;
                page.scrape().await
            },
            move || login.recover(credentials),
        )
        .await?;
    Ok(snapshot)
}
