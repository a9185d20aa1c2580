//! Parsing helpers for scraped and API-sourced values.

pub mod dates;
pub mod money;
pub mod text;

pub use dates::{parse_date, parse_transaction_time};
pub use money::{parse_money, round_money, try_parse_money};
pub use text::{account_number, clean_account_name};
