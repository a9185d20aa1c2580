//! Part 4: move money between two accounts and prove the balances moved.

use altoro_domain::constants::SHEET_TRANSFER_DETAILS;
use altoro_domain::utils::{account_number, clean_account_name};
use altoro_domain::{
    Account, AltoroError, BalanceCheck, Result, Row, Table, TransferReceipt, TransferVerification,
};
use rust_decimal::Decimal;
use tracing::{error, info, instrument};

use super::session::BrowserSession;
use super::WorkflowContext;
use crate::pages::{AccountsPage, TransferPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub receipt: TransferReceipt,
    pub verification: TransferVerification,
}

fn total_balance(accounts: &[Account], label: &str, when: &str) -> Result<Decimal> {
    let id = account_number(label);
    accounts
        .iter()
        .find(|a| a.account_id == id)
        .map(|a| a.total_balance)
        .ok_or_else(|| AltoroError::NotFound(format!("account '{label}' {when} the transfer")))
}

/// Source must drop and destination rise by exactly `amount`, to the cent.
///
/// # Errors
/// `NotFound` when either account is missing from a snapshot.
pub fn verify_balances(
    before: &[Account],
    after: &[Account],
    from_label: &str,
    to_label: &str,
    amount: Decimal,
) -> Result<TransferVerification> {
    let source = BalanceCheck::new(
        from_label,
        total_balance(before, from_label, "before")?,
        total_balance(after, from_label, "after")?,
        -amount,
    );
    let destination = BalanceCheck::new(
        to_label,
        total_balance(before, to_label, "before")?,
        total_balance(after, to_label, "after")?,
        amount,
    );
    Ok(TransferVerification { source, destination })
}

fn mismatch(check: &BalanceCheck, side: &str) -> Option<String> {
    (!check.is_verified()).then(|| {
        format!(
            "{side} balance for {}: expected {:.2}, got {:.2}",
            check.account, check.expected, check.actual
        )
    })
}

pub fn details_table(receipt: &TransferReceipt, verification: &TransferVerification) -> Table {
    let (source, destination) = (&verification.source, &verification.destination);
    Table::from_rows([Row::new()
        .with("Source Account", clean_account_name(&source.account))
        .with("Destination Account", clean_account_name(&destination.account))
        .with("Transfer Amount", receipt.amount)
        .with("Confirmation Message", receipt.confirmation_message.as_str())
        .with("Reference Number", receipt.reference_number.clone().unwrap_or_default())
        .with("Status", receipt.status.label())
        .with("Transaction Timestamp", receipt.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .with("Source Balance Before", source.before)
        .with("Source Balance After", source.after)
        .with("Destination Balance Before", destination.before)
        .with("Destination Balance After", destination.after)])
}

/// Writes `Transfer_Details` once both balances check out.
///
/// # Errors
/// `AltoroError::Verification` when either balance moved by anything other
/// than the transfer amount.
#[instrument(skip(ctx))]
pub async fn run(ctx: &WorkflowContext) -> Result<TransferReport> {
    let session = BrowserSession::open(ctx).await?;
    let result = transfer_and_snapshot(ctx, &session).await;
    session.close().await;
    let (before, receipt, after) = result?;

    let settings = ctx.settings().transfer();
    let verification =
        verify_balances(&before, &after, &settings.from, &settings.to, settings.amount)?;
    let problems: Vec<String> = [
        mismatch(&verification.source, "source"),
        mismatch(&verification.destination, "destination"),
    ]
        .into_iter()
        .flatten()
        .collect();
    if !problems.is_empty() {
        let message = problems.join("; ");
        error!(%message, "transfer verification failed");
        return Err(AltoroError::Verification(message));
    }
    info!(
        source_before = %verification.source.before,
        source_after = %verification.source.after,
        destination_before = %verification.destination.before,
        destination_after = %verification.destination.after,
        "transfer verified"
    );

    ctx.sink().write_table(SHEET_TRANSFER_DETAILS, &details_table(&receipt, &verification)).await?;
    Ok(TransferReport { receipt, verification })
}

async fn transfer_and_snapshot(
    ctx: &WorkflowContext,
    session: &BrowserSession<'_>,
) -> Result<(Vec<Account>, TransferReceipt, Vec<Account>)> {
    let settings = ctx.settings();
    let transfer = settings.transfer();
    session.sign_in().await?;

    let accounts = AccountsPage::new(session.actions());
    let page = TransferPage::new(session.actions());
    let login = session.login_page();
    let credentials = session.credentials();
    let (accounts, page, login, credentials) = (&accounts, &page, &login, &credentials);
    let reauth = move || login.recover(credentials);
    let read_balances = move || async move {
        accounts.open().await?;
        accounts.read_accounts().await
    };

    let before = session.recovery("balances_before").run(read_balances, reauth).await?;
    info!(accounts = before.len(), "captured balances before transfer");

    let (from, to, amount) = (transfer.from.as_str(), transfer.to.as_str(), transfer.amount);
    let dir = settings.paths().screenshot_dir.as_path();
    let receipt = session
        .recovery("transfer")
        .run(move || page.run_transfer(from, to, amount, dir), reauth)
        .await?;
    info!(status = %receipt.status, message = %receipt.confirmation_message, "transfer executed");

    let after: Vec<Account> = session.recovery("balances_after").run(read_balances, reauth).await?;
    info!(accounts = after.len(), "captured balances after transfer");
    Ok((before, receipt, after))
}

#[cfg(test)]
mod tests {
    use altoro_domain::{CellValue, TransferStatus};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::testing::Harness;

    fn account(id: &str, total: Decimal) -> Account {
        Account {
            account_id: id.into(),
            account_name: id.into(),
            total_balance: total,
            available_balance: total,
        }
    }

    #[test]
    fn test_verification_matches_labels_by_account_number() {
        let before = [account("800002", dec!(1000.00)), account("800003", dec!(50.00))];
        let after = [account("800002", dec!(750.00)), account("800003", dec!(300.00))];

        let check =
            verify_balances(&before, &after, "800002 Savings", "800003 Checking", dec!(250.00))
                .expect("found");

        assert!(check.is_verified());
        assert_eq!(check.source.expected, dec!(750.00));
    }

    #[test]
    fn test_missing_account_is_not_found() {
        let before = [account("800002", dec!(1000.00))];
        let err = verify_balances(&before, &before, "800002 Savings", "800009 Other", dec!(1))
            .expect_err("missing");
        assert!(matches!(err, AltoroError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transfer_is_verified_and_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());

        let report = run(&harness.ctx).await.expect("part 4");

        assert_eq!(report.receipt.status, TransferStatus::Success);
        assert_eq!(report.verification.source.after, dec!(9750.00));
        assert_eq!(report.verification.destination.after, dec!(2750.00));
        assert_eq!(harness.site.total("800003"), Some(dec!(2750.00)));

        let details = harness.sink.sheet("Transfer_Details").expect("details");
        assert_eq!(details.rows()[0].value("Source Account"), CellValue::text("Savings"));
        assert_eq!(details.rows()[0].value("Transfer Amount"), CellValue::Money(dec!(250.00)));
    }

    #[tokio::test]
    async fn test_balance_drift_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(dir.path());
        harness.site.skew("800003", dec!(0.01));

        let err = run(&harness.ctx).await.expect_err("drift");

        assert!(matches!(
            &err,
            AltoroError::Verification(m) if m.contains("destination") && m.contains("2750.00")
        ));
        assert!(harness.sink.sheet("Transfer_Details").is_none());
    }
}
