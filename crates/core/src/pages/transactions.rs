//! Recent transactions page.

use altoro_domain::utils::{parse_money, parse_transaction_time};
use altoro_domain::Transaction;
use chrono::NaiveDate;
use tracing::debug;

use crate::browser::{BrowserError, PageActions, Target};

pub const RECENT_LINK: &str = "View Recent Transactions";
pub const TRANSACTIONS_TABLE: &str = "#_ctl0__ctl0_Content_Main_MyTransactions";
pub const START_DATE_FIELD: &str = r#"input[name="startDate"]"#;
pub const END_DATE_FIELD: &str = r#"input[name="endDate"]"#;
pub const FILTER_SUBMIT: &str = r#"input[type="submit"][value="Submit"]"#;

/// Turn table rows into transactions.
///
/// The first row is the header. Rows with fewer than five cells, or whose
/// time does not match `time_format`, are dropped.
pub fn parse_transaction_rows(rows: &[Vec<String>], time_format: &str) -> Vec<Transaction> {
    rows.iter()
        .skip(1)
        .filter(|cells| cells.len() >= 5)
        .filter_map(|cells| {
            let Some(time) = parse_transaction_time(&cells[1], time_format) else {
                debug!(
                    transaction_id = %cells[0],
                    raw = %cells[1],
                    "skipping row with unparseable time"
                );
                return None;
            };
            Some(Transaction::new(&cells[0], time, &cells[2], &cells[3], parse_money(&cells[4])))
        })
        .collect()
}

pub struct TransactionsPage<'a> {
    actions: PageActions<'a>,
}

impl<'a> TransactionsPage<'a> {
    pub fn new(actions: PageActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn open_recent(&self) -> Result<(), BrowserError> {
        self.actions.click_if_present(&Target::link(RECENT_LINK)).await?;
        Ok(())
    }

    /// Apply the After/Before filter. A page without the form is left as is.
    pub async fn filter_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<(), BrowserError> {
        let driver = self.actions.driver();
        let (start_field, end_field) = (Target::css(START_DATE_FIELD), Target::css(END_DATE_FIELD));
        if driver.count(&start_field).await? == 0 || driver.count(&end_field).await? == 0 {
            debug!("date filter form not present");
            return Ok(());
        }
        self.actions.fill(&start_field, &start.format("%Y-%m-%d").to_string()).await?;
        self.actions.fill(&end_field, &end.format("%Y-%m-%d").to_string()).await?;
        self.actions.click(&Target::css(FILTER_SUBMIT)).await
    }

    pub async fn read_transactions(
        &self,
        time_format: &str,
    ) -> Result<Vec<Transaction>, BrowserError> {
        let rows = self.actions.driver().table_rows(&Target::css(TRANSACTIONS_TABLE)).await?;
        Ok(parse_transaction_rows(&rows, time_format))
    }
}
