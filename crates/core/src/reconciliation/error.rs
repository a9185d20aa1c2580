use altoro_common::error::{ErrorClassification, FailureKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid reconciliation input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconError {
    #[error("tolerance must not be negative (got {0})")]
    NegativeTolerance(Decimal),

    #[error("at least one field pair is required")]
    NoFieldPairs,

    #[error("table {side} has no '{column}' column")]
    MissingKeyColumn { side: &'static str, column: String },
}

impl ErrorClassification for ReconError {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Fatal
    }
}
