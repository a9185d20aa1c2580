//! Records returned by the REST API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::table::Row;

/// Account details from `GET /api/account/{id}`, or a basic fallback row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAccount {
    pub account_id: String,
    pub account_name: String,
    pub account_type: String,
    pub balance: Decimal,
    pub available_balance: Decimal,
    pub api_source: String,
}

impl ApiAccount {
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("account_id", self.account_id.as_str())
            .with("account_name", self.account_name.as_str())
            .with("account_type", self.account_type.as_str())
            .with("balance", self.balance)
            .with("available_balance", self.available_balance)
            .with("api_source", self.api_source.as_str())
    }
}

/// One entry of `POST /api/account/{id}/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTransaction {
    pub account_id: String,
    pub transaction_id: String,
    pub transaction_date: String,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub amount: Decimal,
    pub api_source: String,
}

impl ApiTransaction {
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("account_id", self.account_id.as_str())
            .with("transaction_id", self.transaction_id.as_str())
            .with("transaction_date", self.transaction_date.as_str())
            .with("description", self.description.as_str())
            .with("debit", self.debit)
            .with("credit", self.credit)
            .with("amount", self.amount)
            .with("api_source", self.api_source.as_str())
    }
}
