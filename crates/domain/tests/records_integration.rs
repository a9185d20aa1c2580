//! Integration tests for the report-facing record types
//!
//! Exercises the path from scraped values to sheet rows the way the
//! workflow uses it: parse the raw cell text, build the record, then render
//! it into a [`Table`].

use altoro_domain::constants::{
    ACCOUNT_SUMMARY_COLUMNS, HIGH_VALUE_CREDIT_THRESHOLD, TRANSACTION_DISPLAY_COLUMNS,
};
use altoro_domain::utils::{parse_money, parse_transaction_time};
use altoro_domain::{Account, CellValue, RawSettings, Settings, Table, Transaction};
use rust_decimal_macros::dec;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn scraped(id: &str, time: &str, account: &str, action: &str, amount: &str) -> Transaction {
    let time = parse_transaction_time(time, TIME_FORMAT).expect("scraped time parses");
    Transaction::new(id, time, account, action, parse_money(amount))
}

#[test]
fn test_transactions_render_into_display_table() {
    let txns = vec![
        scraped("2301", "2025-03-04 10:15", "800002", "Deposit", "$20,000.00"),
        scraped("2302", "2025-03-05 08:00", "800003", "Withdrawal", "$125.50"),
        scraped("2303", "2025-03-06 12:30", "800003", "Withdrawal", "($40.00)"),
    ];

    let table = Table::from_rows(txns.iter().map(|t| t.to_display_row(TIME_FORMAT)));

    let expected: Vec<String> =
        TRANSACTION_DISPLAY_COLUMNS.iter().map(ToString::to_string).collect();
    assert_eq!(table.columns(), expected.as_slice());
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[0].decimal("Credit"), Some(dec!(20000.00)));
    assert_eq!(table.rows()[1].decimal("Debit"), Some(dec!(125.50)));
    assert_eq!(table.rows()[2].decimal("Debit"), Some(dec!(40.00)));
    assert_eq!(table.rows()[0].value("Transaction Time"), CellValue::text("2025-03-04 10:15"));
}

#[test]
fn test_high_value_credit_threshold_is_inclusive() {
    let txns = [
        scraped("1", "2025-03-01 09:00", "800002", "Deposit", "149.99"),
        scraped("2", "2025-03-01 09:00", "800002", "Deposit", "150.00"),
    ];

    let high: Vec<_> = txns.iter().filter(|t| t.credit >= HIGH_VALUE_CREDIT_THRESHOLD).collect();

    assert_eq!(HIGH_VALUE_CREDIT_THRESHOLD, dec!(150.00));
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].transaction_id, "2");
}

#[test]
fn test_account_summary_rows_use_clean_names() {
    let account = Account {
        account_id: "800002".into(),
        account_name: "800002 Savings".into(),
        total_balance: dec!(1200.50),
        available_balance: dec!(1100.00),
    };

    let table = Table::from_rows([account.to_summary_row()]);

    assert_eq!(table.columns()[..], ACCOUNT_SUMMARY_COLUMNS.map(String::from)[..]);
    assert_eq!(table.rows()[0].value(ACCOUNT_SUMMARY_COLUMNS[1]), CellValue::text("Savings"));
}

#[test]
fn test_env_style_overrides_feed_validation() {
    let mut raw = RawSettings::default();
    raw.apply_override("TRANSFER_TO", "800002 Savings").expect("string override");
    raw.apply_override("FILTER_START", "2025-01-01").expect("string override");

    let err = Settings::from_raw(raw).expect_err("same source and destination");

    assert_eq!(err.violations().len(), 1);
    assert!(err.has_field("transfer_to"));
}
