//! Domain records scraped from the site or returned by its REST API.

pub mod api;
pub mod banking;
pub mod catalog;
pub mod table;

pub use api::{ApiAccount, ApiTransaction};
pub use banking::{
    Account, AccountActivity, BalanceCheck, Transaction, TransferReceipt, TransferStatus,
    TransferVerification,
};
pub use catalog::{Product, Section};
pub use table::{CellValue, Row, Table};
