//! Account summary page: balances and per-account history.

use altoro_domain::utils::parse_money;
use altoro_domain::{Account, AccountActivity};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::browser::{BrowserError, PageActions, SelectOption, Target};

pub const ACCOUNT_SELECT: &str = "#listAccounts";
pub const GET_ACCOUNT_BUTTON: &str = "#btnGetAccount";
pub const SUMMARY_LINK: &str = "View Account Summary";
pub const BALANCE_TABLE: &str = "//table[.//th[contains(., 'Balance Detail')]]";
pub const CREDITS_PANEL: &str = "div#credits";
pub const DEBITS_PANEL: &str = "div#debits";

/// Everything scraped from one pass over the account selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountsSnapshot {
    pub accounts: Vec<Account>,
    /// History per account id, in selector order.
    pub activity: Vec<(String, Vec<AccountActivity>)>,
}

/// Ending and available balance from the Balance Detail rows. Missing rows
/// read as zero.
pub fn parse_balance_rows(rows: &[Vec<String>]) -> (Decimal, Decimal) {
    let mut total = Decimal::ZERO;
    let mut available = Decimal::ZERO;
    for cells in rows.iter().filter(|cells| cells.len() >= 2) {
        if cells[0].contains("Ending balance") {
            total = parse_money(&cells[1]);
        } else if cells[0].contains("Available balance") {
            available = parse_money(&cells[1]);
        }
    }
    (total, available)
}

/// History rows have at least four cells: marker, date, description, amount.
pub fn parse_history_rows(
    account_id: &str,
    rows: &[Vec<String>],
    credit: bool,
) -> Vec<AccountActivity> {
    rows.iter()
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let amount = parse_money(&cells[3]);
            AccountActivity {
                account_id: account_id.to_string(),
                date: cells[1].clone(),
                description: cells[2].clone(),
                credit: credit.then_some(amount),
                debit: (!credit).then_some(amount),
            }
        })
        .collect()
}

pub struct AccountsPage<'a> {
    actions: PageActions<'a>,
}

impl<'a> AccountsPage<'a> {
    pub fn new(actions: PageActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn open(&self) -> Result<(), BrowserError> {
        self.actions.click_if_present(&Target::link(SUMMARY_LINK)).await?;
        Ok(())
    }

    /// Selector options with a non-blank value.
    pub async fn account_options(&self) -> Result<Vec<SelectOption>, BrowserError> {
        let options = self.actions.driver().options(&Target::css(ACCOUNT_SELECT)).await?;
        Ok(options
            .into_iter()
            .filter(|o| !o.value.trim().is_empty())
            .map(|o| SelectOption::new(o.value.trim(), o.label.trim()))
            .collect())
    }

    pub async fn select_account(&self, account_id: &str) -> Result<(), BrowserError> {
        self.actions.select(&Target::css(ACCOUNT_SELECT), account_id).await?;
        self.actions.click(&Target::css(GET_ACCOUNT_BUTTON)).await
    }

    pub async fn balances(&self) -> Result<(Decimal, Decimal), BrowserError> {
        let rows = self.actions.driver().table_rows(&Target::xpath(BALANCE_TABLE)).await?;
        Ok(parse_balance_rows(&rows))
    }

    /// Credits then debits for the selected account.
    pub async fn history(&self, account_id: &str) -> Result<Vec<AccountActivity>, BrowserError> {
        let driver = self.actions.driver();
        let mut records = Vec::new();
        for (panel, credit) in [(CREDITS_PANEL, true), (DEBITS_PANEL, false)] {
            if !driver.is_visible(&Target::css(panel)).await? {
                continue;
            }
            let table = Target::css(format!("{panel} table"));
            if driver.count(&table).await? == 0 {
                continue;
            }
            let rows = driver.table_rows(&table).await?;
            records.extend(parse_history_rows(account_id, &rows, credit));
        }
        Ok(records)
    }

    /// Select every account in turn and read its balances.
    pub async fn read_accounts(&self) -> Result<Vec<Account>, BrowserError> {
        let options = self.account_options().await?;
        let mut accounts = Vec::with_capacity(options.len());
        for option in options {
            self.select_account(&option.value).await?;
            let (total, available) = self.balances().await?;
            accounts.push(Account {
                account_id: option.value,
                account_name: option.label,
                total_balance: total,
                available_balance: available,
            });
        }
        Ok(accounts)
    }

    /// Balances and history for every account.
    pub async fn scrape(&self) -> Result<AccountsSnapshot, BrowserError> {
        let options = self.account_options().await?;
        info!(accounts = options.len(), "found accounts");
        let mut snapshot = AccountsSnapshot::default();
        for option in options {
            self.select_account(&option.value).await?;
            let (total, available) = self.balances().await?;
            let history = self.history(&option.value).await?;
            debug!(
                account_id = %option.value,
                %total,
                %available,
                history = history.len(),
                "account scraped"
            );
            snapshot.activity.push((option.value.clone(), history));
            snapshot.accounts.push(Account {
                account_id: option.value,
                account_name: option.label,
                total_balance: total,
                available_balance: available,
            });
        }
        Ok(snapshot)
    }
}
