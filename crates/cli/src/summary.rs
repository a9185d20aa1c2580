//! Human-readable run summaries for stdout.

use altoro_core::pages::AccountsSnapshot;
use altoro_core::workflow::{
    ApiValidation, LoginReport, PartOutcome, TransactionsReport, TransferReport,
};
use altoro_core::{MatchStatus, PipelineReport, ReconciliationReport};
use altoro_domain::Product;

fn login(report: &LoginReport) -> String {
    format!(
        "login: signed in on attempt {}, negative check saw \"{}\"",
        report.attempts, report.negative_login_message
    )
}

fn accounts(snapshot: &AccountsSnapshot) -> String {
    let entries: usize = snapshot.activity.iter().map(|(_, rows)| rows.len()).sum();
    format!("accounts: {} accounts, {entries} activity rows", snapshot.accounts.len())
}

fn transactions(report: &TransactionsReport) -> String {
    format!(
        "transactions: {} in range, {} high-value credits",
        report.transactions.len(),
        report.high_value_credits.len()
    )
}

fn transfer(report: &TransferReport) -> String {
    let verdict = if report.verification.is_verified() { "verified" } else { "NOT verified" };
    format!(
        "transfer: {} from {} to {}, balances {verdict}",
        report.receipt.amount, report.receipt.from_account, report.receipt.to_account
    )
}

fn products(products: &[Product]) -> String {
    format!("products: {} catalogue entries", products.len())
}

fn reconciliation(label: &str, report: Option<&ReconciliationReport>) -> String {
    match report {
        None => format!("{label}: no web data"),
        Some(r) => format!(
            "{label}: {} match, {} variance, {} missing, {} partial",
            r.count(MatchStatus::Match),
            r.count(MatchStatus::Variance),
            r.count(MatchStatus::DataMissing),
            r.count(MatchStatus::PartialData)
        ),
    }
}

fn api_validation(outcome: &ApiValidation) -> Vec<String> {
    match outcome {
        ApiValidation::Unavailable(reason) => {
            vec![format!("api-validate: API unavailable ({reason})")]
        }
        ApiValidation::Completed(report) => vec![
            format!(
                "api-validate: {} accounts, {} transactions from the API",
                report.api_accounts.len(),
                report.api_transactions.len()
            ),
            reconciliation("  accounts", report.accounts.as_ref()),
            reconciliation("  transactions", report.transactions.as_ref()),
        ],
    }
}

pub fn outcome_lines(outcome: &PartOutcome) -> Vec<String> {
    match outcome {
        PartOutcome::Login(r) => vec![login(r)],
        PartOutcome::Accounts(s) => vec![accounts(s)],
        PartOutcome::Transactions(r) => vec![transactions(r)],
        PartOutcome::Transfer(r) => vec![transfer(r)],
        PartOutcome::Products(p) => vec![products(p)],
        PartOutcome::ApiValidation(v) => api_validation(v),
    }
}

pub fn pipeline_lines(report: &PipelineReport) -> Vec<String> {
    let mut lines = vec![
        login(&report.login),
        accounts(&report.accounts),
        transactions(&report.transactions),
        transfer(&report.transfer),
        products(&report.products),
    ];
    lines.extend(api_validation(&report.api_validation));
    lines
}
