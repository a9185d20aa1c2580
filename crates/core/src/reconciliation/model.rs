//! Reconciliation results.

use altoro_domain::impl_label_conversions;
use altoro_domain::{Row, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Every compared field is within tolerance.
    Match,
    /// At least one field differs by the tolerance or more.
    Variance,
    /// The key exists on one side only.
    DataMissing,
    /// The key exists on both sides but a compared field is blank on one.
    PartialData,
}

impl_label_conversions!(MatchStatus {
    Match => "Match",
    Variance => "Variance",
    DataMissing => "Data Missing",
    PartialData => "Partial Data",
});

/// A numeric column of table A compared against one of table B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPair {
    /// Prefix of the report columns for this pair.
    pub label: String,
    pub field_a: String,
    pub field_b: String,
}

impl FieldPair {
    pub fn new(
        label: impl Into<String>,
        field_a: impl Into<String>,
        field_b: impl Into<String>,
    ) -> Self {
        Self { label: label.into(), field_a: field_a.into(), field_b: field_b.into() }
    }

    /// Same column name on both sides.
    pub fn same(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(field.clone(), field.clone(), field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub label: String,
    pub value_a: Option<Decimal>,
    pub value_b: Option<Decimal>,
    /// `value_a - value_b` rounded to cents; `None` unless both sides exist.
    pub variance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub key: String,
    pub fields: Vec<FieldComparison>,
    pub status: MatchStatus,
}

impl ReconciliationRow {
    pub fn field(&self, label: &str) -> Option<&FieldComparison> {
        self.fields.iter().find(|f| f.label == label)
    }
}

/// Rows in key order: table A's keys first, then keys only found in B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub key_column: String,
    pub rows: Vec<ReconciliationRow>,
}

impl ReconciliationReport {
    pub fn row(&self, key: &str) -> Option<&ReconciliationRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn count(&self, status: MatchStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table with `{label}_a`, `{label}_b` and `{label}_variance` per field
    /// plus `match_status`.
    pub fn to_table(&self) -> Table {
        self.to_labelled_table("a", "b")
    }

    /// Like [`to_table`](Self::to_table) with custom side suffixes, e.g.
    /// `api` and `web`.
    pub fn to_labelled_table(&self, side_a: &str, side_b: &str) -> Table {
        Table::from_rows(self.rows.iter().map(|r| {
            let mut row = Row::new().with(self.key_column.as_str(), r.key.as_str());
            for f in &r.fields {
                row.set(format!("{}_{side_a}", f.label), f.value_a);
                row.set(format!("{}_{side_b}", f.label), f.value_b);
                row.set(format!("{}_variance", f.label), f.variance);
            }
            row.set("match_status", r.status.label());
            row
        }))
    }
}
