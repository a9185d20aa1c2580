//! # Altoro Domain
//!
//! Business types for the Altoro Mutual automation run.
//!
//! This crate contains:
//! - Scraped and API records (accounts, transactions, transfers, products)
//! - The row/column [`Table`] model every report sheet is written from
//! - Validated run [`Settings`]
//! - Domain error types and Result definitions
//! - Parsing helpers for money, dates and account labels
//!
//! ## Architecture
//! - No dependencies on other Altoro crates
//! - Pure data and parsing, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

pub use config::{RawSettings, Settings, SettingsError};
pub use errors::*;
pub use types::*;
