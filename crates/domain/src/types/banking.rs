//! Accounts, transactions and transfers as seen through the web UI.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::ACCOUNT_SUMMARY_COLUMNS;
use crate::impl_label_conversions;
use crate::types::table::Row;
use crate::utils::{clean_account_name, round_money};

/// One account from the summary page's account selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    /// Option label as shown on the site, e.g. `800002 Savings`.
    pub account_name: String,
    pub total_balance: Decimal,
    pub available_balance: Decimal,
}

impl Account {
    /// Label without the leading account number.
    pub fn display_name(&self) -> String {
        clean_account_name(&self.account_name)
    }

    /// Row for the account summary sheet.
    pub fn to_summary_row(&self) -> Row {
        Row::new()
            .with(ACCOUNT_SUMMARY_COLUMNS[0], self.account_id.as_str())
            .with(ACCOUNT_SUMMARY_COLUMNS[1], self.display_name())
            .with(ACCOUNT_SUMMARY_COLUMNS[2], self.total_balance)
            .with(ACCOUNT_SUMMARY_COLUMNS[3], self.available_balance)
    }
}

/// A row from an account's credit or debit history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account_id: String,
    pub date: String,
    pub description: String,
    pub credit: Option<Decimal>,
    pub debit: Option<Decimal>,
}

impl AccountActivity {
    pub fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("Transaction Date", self.date.as_str())
            .with("Transaction Description", self.description.as_str());
        if let Some(credit) = self.credit {
            row.set("Credit Amount", credit);
        }
        if let Some(debit) = self.debit {
            row.set("Debit Amount", debit);
        }
        row
    }
}

/// A row from the recent-transactions page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_time: NaiveDateTime,
    pub account_id: String,
    pub action: String,
    pub amount: Decimal,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl Transaction {
    /// Build a transaction, splitting the signed amount into debit or credit.
    ///
    /// Withdrawals and negative amounts are debits; everything else is a
    /// credit. Both sides hold absolute values.
    pub fn new(
        transaction_id: impl Into<String>,
        transaction_time: NaiveDateTime,
        account_id: impl Into<String>,
        action: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        let action = action.into();
        let is_debit =
            action.trim().eq_ignore_ascii_case("withdrawal") || amount.is_sign_negative();
        let (debit, credit) = if is_debit {
            (amount.abs(), Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount.abs())
        };
        Self {
            transaction_id: transaction_id.into(),
            transaction_time,
            account_id: account_id.into(),
            action,
            amount,
            debit,
            credit,
        }
    }

    /// Row using the display column names.
    pub fn to_display_row(&self, time_format: &str) -> Row {
        Row::new()
            .with("Transaction ID", self.transaction_id.as_str())
            .with("Transaction Time", self.transaction_time.format(time_format).to_string())
            .with("Account ID", self.account_id.as_str())
            .with("Action", self.action.as_str())
            .with("Debit", self.debit)
            .with("Credit", self.credit)
    }
}

/// Outcome reported by the transfer confirmation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Success,
    Unknown,
}

impl_label_conversions!(TransferStatus {
    Success => "success",
    Unknown => "unknown",
});

impl TransferStatus {
    /// `Success` when the confirmation mentions "successfully".
    pub fn from_message(message: &str) -> Self {
        if message.to_lowercase().contains("successfully") {
            Self::Success
        } else {
            Self::Unknown
        }
    }
}

/// What the transfer page reported after submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub confirmation_message: String,
    pub reference_number: Option<String>,
    pub status: TransferStatus,
    pub screenshot: Option<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

/// Expected vs actual balance of one side of a transfer, in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub account: String,
    pub before: Decimal,
    pub after: Decimal,
    pub expected: Decimal,
    pub actual: Decimal,
}

impl BalanceCheck {
    /// `delta` is applied to `before`; both expectation and observation are
    /// rounded to two places before comparing.
    pub fn new(
        account: impl Into<String>,
        before: Decimal,
        after: Decimal,
        delta: Decimal,
    ) -> Self {
        Self {
            account: account.into(),
            before,
            after,
            expected: round_money(before + delta),
            actual: round_money(after),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.expected == self.actual
    }
}

/// Balance movement on both sides of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferVerification {
    pub source: BalanceCheck,
    pub destination: BalanceCheck,
}

impl TransferVerification {
    pub fn is_verified(&self) -> bool {
        self.source.is_verified() && self.destination.is_verified()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::table::CellValue;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 12).and_then(|d| d.and_hms_opt(hour, 0, 0)).expect("valid")
    }

    #[test]
    fn test_transaction_splits_debit_and_credit() {
        let withdrawal = Transaction::new("1", at(9), "800002", "Withdrawal", dec!(100.00));
        assert_eq!((withdrawal.debit, withdrawal.credit), (dec!(100.00), dec!(0)));

        let negative = Transaction::new("2", at(10), "800002", "Deposit", dec!(-42.50));
        assert_eq!((negative.debit, negative.credit), (dec!(42.50), dec!(0)));

        let deposit = Transaction::new("3", at(11), "800003", "Deposit", dec!(250.00));
        assert_eq!((deposit.debit, deposit.credit), (dec!(0), dec!(250.00)));
    }

    #[test]
    fn test_display_row_formats_time() {
        let txn = Transaction::new("17", at(14), "800003", "Deposit", dec!(9.99));
        let row = txn.to_display_row("%Y-%m-%d %H:%M");
        assert_eq!(row.value("Transaction Time"), CellValue::text("2025-03-12 14:00"));
        assert_eq!(row.value("Credit"), CellValue::Money(dec!(9.99)));
    }

    #[test]
    fn test_summary_row_uses_clean_name() {
        let account = Account {
            account_id: "800002".into(),
            account_name: "800002 Savings".into(),
            total_balance: dec!(1000),
            available_balance: dec!(900),
        };
        let row = account.to_summary_row();
        assert_eq!(row.value("Account Name/Type"), CellValue::text("Savings"));
        assert_eq!(row.value("Account ID/Number"), CellValue::text("800002"));
    }

    #[test]
    fn test_status_from_message() {
        assert_eq!(
            TransferStatus::from_message("250.0 was Successfully transferred from Account 800002"),
            TransferStatus::Success
        );
        assert_eq!(TransferStatus::from_message(""), TransferStatus::Unknown);
        assert_eq!(TransferStatus::Success.to_string(), "success");
    }

    #[test]
    fn test_balance_check_is_exact_to_cents() {
        let source =
            BalanceCheck::new("800002 Savings", dec!(1000.00), dec!(750.00), dec!(-250.00));
        assert!(source.is_verified());

        let drifted =
            BalanceCheck::new("800003 Checking", dec!(500.00), dec!(750.01), dec!(250.00));
        assert!(!drifted.is_verified());
        assert_eq!(drifted.expected, dec!(750.00));

        let rounding = BalanceCheck::new("x", dec!(10.004), dec!(10.00), dec!(0));
        assert!(rounding.is_verified());
    }
}
