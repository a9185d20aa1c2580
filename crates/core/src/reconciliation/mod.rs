//! Keyed comparison of API-sourced and browser-scraped tables.
//!
//! [`reconcile`] performs a full outer join on one key column and compares
//! numeric field pairs within a tolerance. [`aggregate`] prepares inputs
//! (column renames, per-account sums) so both sides share a shape.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod model;

pub use aggregate::{group_and_sum, net_amount, normalize_columns, ColumnRule, TRANSACTION_COUNT};
pub use engine::reconcile;
pub use error::ReconError;
pub use model::{FieldComparison, FieldPair, MatchStatus, ReconciliationReport, ReconciliationRow};
