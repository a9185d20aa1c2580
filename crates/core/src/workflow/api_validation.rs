//! Part 6: pull accounts and transactions from the REST API and reconcile
//! them against the scraped sheets.
//!
//! The report is one `API_Data_Validation` sheet of stacked sections. When
//! the API cannot be reached or refuses the credentials the sheet carries a
//! single "API Unavailable" row instead and the part still succeeds.

use altoro_common::error::{ErrorClassification, FailureKind};
use altoro_domain::constants::{
    NO_WEB_DATA, SECTION_ACCOUNTS, SECTION_AUTHENTICATION, SECTION_SUMMARY, SECTION_TRANSACTIONS,
    SHEET_API_VALIDATION, VARIANCE_TOLERANCE,
};
use altoro_domain::{ApiAccount, ApiTransaction, Result, Row, Settings, Table};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use super::WorkflowContext;
use crate::bank_api::{parse, AltoroApi, ApiError};
use crate::reconciliation::{
    group_and_sum, net_amount, normalize_columns, reconcile, ColumnRule, FieldPair, MatchStatus,
    ReconError, ReconciliationReport, TRANSACTION_COUNT,
};
use crate::report::stack_sections;

pub const ACCOUNT_KEY: &str = "account_id";
pub const DATA_SOURCE: &str = "data_source";

const WEB_ACCOUNT_RULES: [ColumnRule; 4] = [
    ColumnRule::new(&["account", "id"], ACCOUNT_KEY),
    ColumnRule::new(&["account", "number"], ACCOUNT_KEY),
    ColumnRule::new(&["total", "balance"], "total"),
    ColumnRule::new(&["available", "balance"], "available"),
];

const WEB_TRANSACTION_RULES: [ColumnRule; 3] = [
    ColumnRule::new(&["account", "id"], ACCOUNT_KEY),
    ColumnRule::new(&["account", "number"], ACCOUNT_KEY),
    ColumnRule::new(&["transaction", "id"], "transaction_id"),
];

/// Display headers of the scraped transaction sheet and the API field each
/// corresponds to.
const DISPLAY_TO_FIELD: [(&str, &str); 6] = [
    ("Transaction ID", "transaction_id"),
    ("Transaction Time", "transaction_time"),
    ("Account ID", ACCOUNT_KEY),
    ("Action", "action"),
    ("Debit", "debit"),
    ("Credit", "credit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiValidationReport {
    pub api_accounts: Vec<ApiAccount>,
    pub api_transactions: Vec<ApiTransaction>,
    /// `None` when there was no web data to compare against.
    pub accounts: Option<ReconciliationReport>,
    pub transactions: Option<ReconciliationReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiValidation {
    Completed(ApiValidationReport),
    /// The API could not be used; carries the failure.
    Unavailable(String),
}

fn account_pairs() -> [FieldPair; 2] {
    [
        FieldPair::new("balance", "balance", "total"),
        FieldPair::new("available_balance", "available_balance", "available"),
    ]
}

fn transaction_pairs() -> [FieldPair; 4] {
    [
        FieldPair::new("total_debits", "debit", "debit"),
        FieldPair::new("total_credits", "credit", "credit"),
        FieldPair::new("txn_count", TRANSACTION_COUNT, TRANSACTION_COUNT),
        FieldPair::same("net"),
    ]
}

fn with_constant(mut table: Table, column: &str, value: &str) -> Table {
    table.ensure_column(column);
    for row in table.rows_mut() {
        row.set(column, value);
    }
    table
}

fn present(table: Option<&Table>) -> Option<&Table> {
    table.filter(|t| !t.is_empty())
}

/// Account section: API balances against the scraped summary.
///
/// # Errors
/// Propagates [`ReconError`] from the engine.
pub fn account_section(
    api: &Table,
    web: Option<&Table>,
) -> std::result::Result<(Table, Option<ReconciliationReport>), ReconError> {
    let Some(web) = present(web) else {
        warn!("no web account data, skipping account reconciliation");
        return Ok((with_constant(api.clone(), "web_match_status", NO_WEB_DATA), None));
    };
    let mut web = web.clone();
    normalize_columns(&mut web, &WEB_ACCOUNT_RULES);
    if !web.has_column(ACCOUNT_KEY) {
        warn!(columns = ?web.columns(), "web account data has no account id column");
        return Ok((with_constant(api.clone(), "web_match_status", NO_WEB_DATA), None));
    }
    let report = reconcile(api, &web, ACCOUNT_KEY, &account_pairs(), VARIANCE_TOLERANCE)?;
    info!(
        accounts = report.rows.len(),
        matches = report.count(MatchStatus::Match),
        "reconciled accounts"
    );
    Ok((report.to_labelled_table("api", "web"), Some(report)))
}

/// Per-account debit and credit totals, transaction count and net.
fn per_account_totals(transactions: &Table) -> Table {
    let mut totals =
        group_and_sum(transactions, ACCOUNT_KEY, &["debit", "credit"], "transaction_id");
    net_amount(&mut totals, "credit", "debit", "net");
    totals
}

/// Totals for one side only, labelled with where they came from.
pub fn transaction_summary(transactions: &Table, source: &str) -> Table {
    let mut summary =
        group_and_sum(transactions, ACCOUNT_KEY, &["debit", "credit"], "transaction_id");
    summary.rename_column("debit", "total_debits");
    summary.rename_column("credit", "total_credits");
    net_amount(&mut summary, "total_credits", "total_debits", "net_amount");
    with_constant(summary, DATA_SOURCE, source)
}

/// Transaction section: per-account API totals against the scraped sheet.
///
/// # Errors
/// Propagates [`ReconError`] from the engine.
pub fn transaction_section(
    api: &Table,
    web: Option<&Table>,
) -> std::result::Result<(Table, Option<ReconciliationReport>), ReconError> {
    let Some(web) = present(web) else {
        warn!("no web transaction data, summarising API transactions only");
        return Ok((transaction_summary(api, "Transaction Summary"), None));
    };
    let mut web = web.clone();
    for (display, field) in DISPLAY_TO_FIELD {
        web.rename_column(display, field);
    }
    normalize_columns(&mut web, &WEB_TRANSACTION_RULES);
    if !web.has_column(ACCOUNT_KEY) {
        warn!(columns = ?web.columns(), "web transaction data has no account id column");
        let row = Row::new()
            .with("Status", "Error: Web data malformed")
            .with("Details", "Missing account_id column");
        return Ok((Table::from_rows([row]), None));
    }
    if api.is_empty() {
        warn!("API returned no transactions, summarising web transactions only");
        return Ok((transaction_summary(&web, "Web Only (API Empty)"), None));
    }
    let report = reconcile(
        &per_account_totals(api),
        &per_account_totals(&web),
        ACCOUNT_KEY,
        &transaction_pairs(),
        VARIANCE_TOLERANCE,
    )?;
    info!(
        accounts = report.rows.len(),
        matches = report.count(MatchStatus::Match),
        "reconciled transactions"
    );
    Ok((report.to_labelled_table("api", "web"), Some(report)))
}

fn date_range(settings: &Settings) -> String {
    let api = settings.api();
    format!("{} to {}", api.filter_start, api.filter_end)
}

fn authentication_section(settings: &Settings) -> Table {
    Table::from_rows([Row::new()
        .with("Status", "Success")
        .with("Username", settings.api().username.as_str())
        .with("API Base URL", settings.site().base_url.as_str().trim_end_matches('/'))
        .with("Token Obtained", "Yes")
        .with("Date Range", date_range(settings))])
}

fn metric(name: &str, count: usize, details: impl Into<String>) -> Row {
    Row::new().with("Metric", name).with("Count", count).with("Details", details.into())
}

struct SummaryInputs<'a> {
    api_accounts: usize,
    api_transactions: usize,
    web_accounts: Option<&'a Table>,
    web_transactions: Option<&'a Table>,
    accounts: Option<&'a ReconciliationReport>,
    transactions: Option<&'a ReconciliationReport>,
}

fn summary_section(settings: &Settings, inputs: &SummaryInputs<'_>) -> Table {
    let mut rows = vec![
        metric("API Accounts Retrieved", inputs.api_accounts, "From GET /api/account"),
        metric(
            "API Transactions Retrieved",
            inputs.api_transactions,
            format!("Date range: {}", date_range(settings)),
        ),
    ];
    if let Some(web) = inputs.web_accounts {
        rows.push(metric("Web Accounts Scraped", web.len(), "From Part 2"));
    }
    if let Some(web) = inputs.web_transactions {
        rows.push(metric("Web Transactions Scraped", web.len(), "From Part 3"));
    }
    if let Some(report) = inputs.accounts {
        rows.push(metric(
            "Account Matches",
            report.count(MatchStatus::Match),
            "Accounts with matching balances",
        ));
        rows.push(metric(
            "Account Variances",
            report.count(MatchStatus::Variance),
            "Accounts with balance differences",
        ));
    }
    if let Some(report) = inputs.transactions {
        rows.push(metric(
            "Transaction Matches (by account)",
            report.count(MatchStatus::Match),
            "Accounts with matching transaction totals",
        ));
        rows.push(metric(
            "Transaction Variances (by account)",
            report.count(MatchStatus::Variance),
            "Accounts with transaction differences",
        ));
    }
    Table::from_rows(rows)
}

/// The single-row report written when the API cannot be used.
pub fn unavailable_table(settings: &Settings, error: &ApiError) -> Table {
    Table::from_rows([Row::new()
        .with("Status", "API Unavailable")
        .with("Message", "Could not authenticate with AltoroMutual REST API")
        .with("Attempted Endpoint", settings.site().url("api/login"))
        .with("Username", settings.api().username.as_str())
        .with("Error", error.to_string())
        .with("Note", "Part 6 skipped - API service may be down or credentials invalid")])
}

/// Rejected credentials, exhausted transient retries and lost connectivity
/// turn into the placeholder report. Anything else is a real failure.
fn is_unavailable(error: &ApiError) -> bool {
    matches!(error.failure_kind(), FailureKind::Authentication | FailureKind::Transient)
}

async fn fetch(
    api: &AltoroApi,
    range: (NaiveDate, NaiveDate),
) -> std::result::Result<(Vec<ApiAccount>, Vec<ApiTransaction>), ApiError> {
    api.authenticate().await?;
    let ids = api.account_ids().await?;

    let mut accounts = Vec::with_capacity(ids.len());
    for id in &ids {
        match api.account_details(id).await {
            Ok(account) => accounts.push(account),
            Err(error) if error.is_auth() => return Err(error),
            Err(error) => {
                warn!(account_id = %id, %error, "account details unavailable, using basic row");
                accounts.push(parse::basic_account(id));
            }
        }
    }

    let mut transactions = Vec::new();
    for id in &ids {
        match api.transactions(id, Some(range)).await {
            Ok(found) => transactions.extend(found),
            Err(error) if error.is_auth() => return Err(error),
            Err(error) => warn!(account_id = %id, %error, "skipping transactions for account"),
        }
    }
    info!(accounts = accounts.len(), transactions = transactions.len(), "API data retrieved");
    Ok((accounts, transactions))
}

/// Writes `API_Data_Validation`. `web_accounts` is the `Account_Summary`
/// sheet and `web_transactions` the `Filtered_Transactions` sheet, when
/// those parts ran.
///
/// # Errors
/// Invalid API retry settings, fatal API responses (4xx other than auth,
/// undecodable bodies) and sink failures.
#[instrument(skip_all)]
pub async fn run(
    ctx: &WorkflowContext,
    web_accounts: Option<&Table>,
    web_transactions: Option<&Table>,
) -> Result<ApiValidation> {
    let settings = ctx.settings();
    let api = AltoroApi::new(ctx.transport(), settings.api())?;
    let range = (settings.api().filter_start, settings.api().filter_end);

    let (api_accounts, api_transactions) = match fetch(&api, range).await {
        Ok(data) => data,
        Err(error) if is_unavailable(&error) => {
            warn!(%error, "API unavailable, writing placeholder report");
            ctx.sink()
                .write_table(SHEET_API_VALIDATION, &unavailable_table(settings, &error))
                .await?;
            return Ok(ApiValidation::Unavailable(error.to_string()));
        }
        Err(error) => return Err(error.into()),
    };

    let api_account_table = Table::from_rows(api_accounts.iter().map(ApiAccount::to_row));
    let api_transaction_table =
        Table::from_rows(api_transactions.iter().map(ApiTransaction::to_row));
    let (account_table, accounts) = account_section(&api_account_table, web_accounts)?;
    let (transaction_table, transactions) =
        transaction_section(&api_transaction_table, web_transactions)?;

    let summary = summary_section(
        settings,
        &SummaryInputs {
            api_accounts: api_accounts.len(),
            api_transactions: api_transactions.len(),
            web_accounts: present(web_accounts),
            web_transactions: present(web_transactions),
            accounts: accounts.as_ref(),
            transactions: transactions.as_ref(),
        },
    );
    let sheet = stack_sections(
        vec![
            (SECTION_AUTHENTICATION, authentication_section(settings)),
            (SECTION_SUMMARY, summary),
            (SECTION_ACCOUNTS, account_table),
            (SECTION_TRANSACTIONS, transaction_table),
        ],
        false,
    );
    ctx.sink().write_table(SHEET_API_VALIDATION, &sheet).await?;
    info!(rows = sheet.len(), "API validation sheet written");

    Ok(ApiValidation::Completed(ApiValidationReport {
        api_accounts,
        api_transactions,
        accounts,
        transactions,
    }))
}

#[cfg(test)]
mod tests {
    use altoro_domain::{Account, CellValue, Transaction};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::bank_api::Method;
    use crate::report::SECTION_COLUMN;
    use crate::testing::Harness;
    use crate::workflow::{accounts, transactions};

    fn web_accounts() -> Table {
        accounts::summary_table(&[
            Account {
                account_id: "800002".into(),
                account_name: "800002 Savings".into(),
                total_balance: dec!(10000.00),
                available_balance: dec!(10000.00),
            },
            Account {
                account_id: "800003".into(),
                account_name: "800003 Checking".into(),
                total_balance: dec!(2500.00),
                available_balance: dec!(2400.00),
            },
        ])
    }

    fn web_transactions(extra_credit: Decimal) -> Table {
        let at = |day| {
            NaiveDate::from_ymd_opt(2025, 3, day)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .expect("valid")
        };
        transactions::display_table(
            &[
                Transaction::new("2301", at(4), "800002", "Deposit", dec!(200.00) + extra_credit),
                Transaction::new("2302", at(5), "800003", "Withdrawal", dec!(-125.50)),
                Transaction::new("2303", at(6), "800003", "Deposit", dec!(150.00)),
                Transaction::new("2304", at(7), "800002", "Deposit", dec!(99.99)),
            ],
            "%Y-%m-%d %H:%M",
        )
    }

    fn completed(outcome: ApiValidation) -> ApiValidationReport {
        match outcome {
            ApiValidation::Completed(report) => report,
            ApiValidation::Unavailable(reason) => panic!("API unavailable: {reason}"),
        }
    }

    fn section_titles(sheet: &Table) -> Vec<String> {
        sheet.rows().iter().filter_map(|r| r.value(SECTION_COLUMN).as_key()).collect()
    }

    #[tokio::test]
    async fn test_matching_sources_reconcile_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        let (accounts, txns) = (web_accounts(), web_transactions(Decimal::ZERO));

        let report =
            completed(run(&harness.ctx, Some(&accounts), Some(&txns)).await.expect("part 6"));

        let account_report = report.accounts.expect("account report");
        assert_eq!(account_report.count(MatchStatus::Match), 2);
        let txn_report = report.transactions.expect("transaction report");
        assert_eq!(txn_report.count(MatchStatus::Match), 2);
        let net = txn_report.row("800003").and_then(|r| r.field("net")).expect("net");
        assert_eq!(net.value_a, Some(dec!(24.50)));

        let sheet = harness.sink.sheet("API_Data_Validation").expect("sheet");
        assert_eq!(
            section_titles(&sheet),
            [SECTION_AUTHENTICATION, SECTION_SUMMARY, SECTION_ACCOUNTS, SECTION_TRANSACTIONS]
        );
        assert_eq!(sheet.rows()[1].value("Token Obtained"), CellValue::text("Yes"));
    }

    #[tokio::test]
    async fn test_web_drift_shows_as_variance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        let (accounts, txns) = (web_accounts(), web_transactions(dec!(0.05)));

        let report =
            completed(run(&harness.ctx, Some(&accounts), Some(&txns)).await.expect("part 6"));

        let txns = report.transactions.expect("transaction report");
        let row = txns.row("800002").expect("800002");
        assert_eq!(row.status, MatchStatus::Variance);
        assert_eq!(row.field("total_credits").and_then(|f| f.variance), Some(dec!(-0.05)));
        assert_eq!(txns.row("800003").map(|r| r.status), Some(MatchStatus::Match));
    }

    #[tokio::test]
    async fn test_without_web_data_reports_api_side_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());

        let report = completed(run(&harness.ctx, None, None).await.expect("part 6"));

        assert!(report.accounts.is_none());
        assert!(report.transactions.is_none());
        let sheet = harness.sink.sheet("API_Data_Validation").expect("sheet");
        assert!(sheet.has_column("web_match_status"));
        let summary = sheet
            .rows()
            .iter()
            .find(|r| r.value(DATA_SOURCE) == CellValue::text("Transaction Summary"));
        assert!(summary.is_some());
        assert!(!sheet
            .rows()
            .iter()
            .any(|r| r.value("Metric") == CellValue::text("Account Matches")));
    }

    #[tokio::test]
    async fn test_rejected_credentials_write_unavailable_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        harness
            .transport
            .fail_login(ApiError::Auth { status: 401, body: "bad credentials".into() });

        let outcome = run(&harness.ctx, None, None).await.expect("completes");

        assert!(matches!(outcome, ApiValidation::Unavailable(_)));
        let sheet = harness.sink.sheet("API_Data_Validation").expect("sheet");
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rows()[0].value("Status"), CellValue::text("API Unavailable"));
        assert_eq!(
            sheet.rows()[0].value("Attempted Endpoint"),
            CellValue::text("https://demo.testfire.net/api/login")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_write_unavailable_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        harness
            .transport
            .fail(Method::Get, "/api/account", ApiError::from_status(503, "maintenance", None));

        let outcome = run(&harness.ctx, None, None).await.expect("completes");

        assert!(matches!(outcome, ApiValidation::Unavailable(reason) if reason.contains("503")));
        let list_calls =
            harness.transport.requests().iter().filter(|r| r.path == "/api/account").count();
        assert_eq!(list_calls, 4);
    }

    #[tokio::test]
    async fn test_failed_details_fall_back_to_basic_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        harness
            .transport
            .fail(Method::Get, "/api/account/800003", ApiError::from_status(404, "gone", None));
        let accounts = web_accounts();

        let report = completed(run(&harness.ctx, Some(&accounts), None).await.expect("part 6"));

        let basic = report
            .api_accounts
            .iter()
            .find(|a| a.account_id == "800003")
            .expect("basic row");
        assert_eq!(basic.account_type, "Unknown");
        let recon = report.accounts.expect("account report");
        assert_eq!(recon.row("800003").map(|r| r.status), Some(MatchStatus::Variance));
        assert_eq!(recon.row("800002").map(|r| r.status), Some(MatchStatus::Match));
    }

    #[tokio::test]
    async fn test_fatal_list_failure_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        harness
            .transport
            .fail(Method::Get, "/api/account", ApiError::from_status(400, "bad request", None));

        let err = run(&harness.ctx, None, None).await.expect_err("fatal");

        assert!(matches!(err, altoro_domain::AltoroError::Api(_)));
        assert!(harness.sink.sheet("API_Data_Validation").is_none());
    }

    #[test]
    fn test_web_only_summary_when_api_has_no_transactions() {
        let (table, report) =
            transaction_section(&Table::new(), Some(&web_transactions(Decimal::ZERO)))
                .expect("section");
        assert!(report.is_none());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].value(DATA_SOURCE), CellValue::text("Web Only (API Empty)"));
        assert_eq!(table.rows()[0].value("net_amount"), CellValue::Money(dec!(299.99)));
    }
}
