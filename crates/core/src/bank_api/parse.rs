//! Decoding of API response bodies into domain records.
//!
//! The demo API is loose about shapes: ids may be strings or numbers, lists
//! may sit under different keys, and money comes as display text. Everything
//! here is lenient and logs what it drops.

use altoro_domain::constants::{
    API_SOURCE_ACCOUNT_DETAILS, API_SOURCE_ACCOUNT_LIST, API_SOURCE_TRANSACTIONS_POST,
};
use altoro_domain::utils::{clean_account_name, parse_money};
use altoro_domain::{ApiAccount, ApiTransaction};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

const ACCOUNT_ID_KEYS: [&str; 3] = ["accountId", "id", "account_id"];
const TRANSACTION_LIST_KEYS: [&str; 3] = ["transactions", "lastTenTransactions", "Transactions"];

/// Text form of a scalar. Null and containers render empty.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// First key whose value renders non-empty.
fn first_text(object: &Value, keys: &[&str]) -> String {
    keys.iter().map(|k| text(object.get(k))).find(|s| !s.is_empty()).unwrap_or_default()
}

/// Money from a display string or a JSON number; unparseable reads as zero.
fn money(value: Option<&Value>) -> Decimal {
    parse_money(&text(value))
}

/// Account ids from `GET /api/account`.
pub fn account_ids(body: &Value) -> Vec<String> {
    let entries = match body {
        Value::Array(items) => items.as_slice(),
        _ => body.get("Accounts").and_then(Value::as_array).map_or(&[][..], Vec::as_slice),
    };
    entries
        .iter()
        .filter_map(|entry| {
            let id = match entry {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Object(_) => first_text(entry, &ACCOUNT_ID_KEYS),
                other => {
                    warn!(entry = %other, "unexpected account entry");
                    return None;
                }
            };
            if id.is_empty() {
                warn!(entry = %entry, "skipping account without id");
                return None;
            }
            Some(id)
        })
        .collect()
}

/// Account from `GET /api/account/{id}`.
pub fn account_details(account_id: &str, body: &Value) -> ApiAccount {
    ApiAccount {
        account_id: account_id.to_string(),
        account_name: clean_account_name(&text(body.get("accountName"))),
        account_type: text(body.get("accountType")),
        balance: money(body.get("balance")),
        available_balance: money(body.get("availableBalance")),
        api_source: API_SOURCE_ACCOUNT_DETAILS.to_string(),
    }
}

/// Placeholder row when the details call failed.
pub fn basic_account(account_id: &str) -> ApiAccount {
    ApiAccount {
        account_id: account_id.to_string(),
        account_name: format!("Account {account_id}"),
        account_type: "Unknown".to_string(),
        balance: Decimal::ZERO,
        available_balance: Decimal::ZERO,
        api_source: format!("{API_SOURCE_ACCOUNT_LIST} (basic)"),
    }
}

/// The transaction array of a response: the first non-empty list key of an
/// object, or the body itself when it is an array.
pub fn transaction_list(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(_) => TRANSACTION_LIST_KEYS
            .iter()
            .filter_map(|k| body.get(k).and_then(Value::as_array))
            .find(|items| !items.is_empty())
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    }
}

/// Transactions of one account. Non-object entries are skipped.
pub fn transactions(account_id: &str, body: &Value) -> Vec<ApiTransaction> {
    let source = API_SOURCE_TRANSACTIONS_POST.replace("{accountNo}", account_id);
    transaction_list(body)
        .iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                warn!(account_id, entry = %entry, "skipping non-object transaction");
                return None;
            }
            Some(ApiTransaction {
                account_id: account_id.to_string(),
                transaction_id: first_text(entry, &["transactionId", "id"]),
                transaction_date: first_text(entry, &["transactionDate", "date"]),
                description: text(entry.get("description")),
                debit: money(entry.get("debit")),
                credit: money(entry.get("credit")),
                amount: money(entry.get("amount")),
                api_source: source.clone(),
            })
        })
        .collect()
}
