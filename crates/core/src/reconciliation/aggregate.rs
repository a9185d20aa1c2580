//! Column normalisation and per-key aggregation used before reconciling
//! web and API tables.

use std::collections::BTreeMap;

use altoro_domain::{CellValue, Row, Table};
use rust_decimal::Decimal;
use tracing::debug;

/// Renames any column whose lowercased name contains every keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub keywords: &'static [&'static str],
    pub target: &'static str,
}

impl ColumnRule {
    pub const fn new(keywords: &'static [&'static str], target: &'static str) -> Self {
        Self { keywords, target }
    }

    fn matches(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.keywords.iter().all(|k| lower.contains(k))
    }
}

/// Apply the first matching rule to each column. Returns the renames made.
pub fn normalize_columns(table: &mut Table, rules: &[ColumnRule]) -> Vec<(String, String)> {
    let renames: Vec<(String, String)> = table
        .columns()
        .iter()
        .filter_map(|column| {
            rules
                .iter()
                .find(|rule| rule.matches(column))
                .filter(|rule| rule.target != column)
                .map(|rule| (column.clone(), rule.target.to_string()))
        })
        .collect();
    for (from, to) in &renames {
        table.rename_column(from, to);
    }
    if !renames.is_empty() {
        debug!(?renames, "normalised columns");
    }
    renames
}

/// Column holding the row count in [`group_and_sum`] output.
pub const TRANSACTION_COUNT: &str = "transaction_count";

/// One row per distinct `key`, sorted by key, with each `sum_fields` column
/// totalled and `transaction_count` counting non-blank `count_field` cells.
/// Blank and non-numeric cells are left out of the sums.
pub fn group_and_sum(table: &Table, key: &str, sum_fields: &[&str], count_field: &str) -> Table {
    let mut groups: BTreeMap<String, (Vec<Decimal>, i64)> = BTreeMap::new();
    for row in table.rows() {
        let Some(k) = row.value(key).as_key() else { continue };
        let (sums, count) =
            groups.entry(k).or_insert_with(|| (vec![Decimal::ZERO; sum_fields.len()], 0));
        for (total, field) in sums.iter_mut().zip(sum_fields) {
            *total += row.decimal(field).unwrap_or(Decimal::ZERO);
        }
        if !row.value(count_field).is_empty() {
            *count += 1;
        }
    }

    let mut columns = vec![key.to_string()];
    columns.extend(sum_fields.iter().map(ToString::to_string));
    columns.push(TRANSACTION_COUNT.to_string());
    let mut out = Table::with_columns(columns);
    for (k, (sums, count)) in groups {
        let mut row = Row::new().with(key, k);
        for (field, total) in sum_fields.iter().zip(sums) {
            row.set(*field, total);
        }
        row.set(TRANSACTION_COUNT, count);
        out.push(row);
    }
    out
}

/// Add `result = credit - debit` to every row. Rows missing either side get
/// an empty cell.
pub fn net_amount(table: &mut Table, credit: &str, debit: &str, result: &str) {
    table.ensure_column(result);
    for row in table.rows_mut() {
        let net = match (row.decimal(credit), row.decimal(debit)) {
            (Some(c), Some(d)) => CellValue::Money(c - d),
            _ => CellValue::Empty,
        };
        row.set(result, net);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const RULES: [ColumnRule; 3] = [
        ColumnRule::new(&["account", "id"], "account_id"),
        ColumnRule::new(&["total", "balance"], "total"),
        ColumnRule::new(&["available", "balance"], "available"),
    ];

    #[test]
    fn test_normalize_uses_first_matching_rule() {
        let mut table = Table::with_columns([
            "Account ID/Number",
            "Account Name/Type",
            "Total Balance",
            "Available Balance",
        ]);
        let renames = normalize_columns(&mut table, &RULES);
        assert_eq!(renames.len(), 3);
        assert_eq!(table.columns(), ["account_id", "Account Name/Type", "total", "available"]);
    }

    #[test]
    fn test_group_and_sum_by_account() {
        let mut txns = Table::new();
        for (id, debit, credit, txn) in [
            ("800003", "125.50", "0", "2302"),
            ("800002", "0", "200.00", "2301"),
            ("800003", "0", "150.00", "2303"),
            ("800002", "", "99.99", ""),
        ] {
            txns.push(
                Row::new()
                    .with("account_id", id)
                    .with("debit", debit)
                    .with("credit", credit)
                    .with("transaction_id", txn),
            );
        }

        let summary = group_and_sum(&txns, "account_id", &["debit", "credit"], "transaction_id");

        assert_eq!(summary.columns(), ["account_id", "debit", "credit", "transaction_count"]);
        let first = &summary.rows()[0];
        assert_eq!(first.value("account_id"), CellValue::text("800002"));
        assert_eq!(first.decimal("credit"), Some(dec!(299.99)));
        assert_eq!(first.value("transaction_count"), CellValue::Integer(1));
        assert_eq!(summary.rows()[1].decimal("debit"), Some(dec!(125.50)));
    }

    #[test]
    fn test_net_amount_is_credit_minus_debit() {
        let mut table = Table::from_rows([
            Row::new().with("credit", dec!(300)).with("debit", dec!(125.5)),
            Row::new().with("credit", dec!(10)),
        ]);
        net_amount(&mut table, "credit", "debit", "net_amount");
        assert!(table.has_column("net_amount"));
        assert_eq!(table.rows()[0].decimal("net_amount"), Some(dec!(174.5)));
        assert_eq!(table.rows()[1].value("net_amount"), CellValue::Empty);
    }
}
