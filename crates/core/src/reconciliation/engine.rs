//! Keyed full outer join with per-field variance.

use std::collections::{HashMap, HashSet};

use altoro_domain::utils::round_money;
use altoro_domain::{Row, Table};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::ReconError;
use super::model::{
    FieldComparison, FieldPair, MatchStatus, ReconciliationReport, ReconciliationRow,
};

/// Compare `table_a` with `table_b` on `key`.
///
/// A field matches when `|a - b| < tolerance`. Reported variances are
/// rounded to cents; the comparison uses the exact difference.
///
/// # Errors
/// Negative tolerance, no field pairs, or a non-empty table without the
/// key column.
pub fn reconcile(
    table_a: &Table,
    table_b: &Table,
    key: &str,
    pairs: &[FieldPair],
    tolerance: Decimal,
) -> Result<ReconciliationReport, ReconError> {
    if tolerance < Decimal::ZERO {
        return Err(ReconError::NegativeTolerance(tolerance));
    }
    if pairs.is_empty() {
        return Err(ReconError::NoFieldPairs);
    }
    let side_a = keyed_rows(table_a, key, "A")?;
    let side_b = keyed_rows(table_b, key, "B")?;
    let lookup_b: HashMap<&str, &Row> = side_b.iter().map(|(k, r)| (k.as_str(), *r)).collect();
    let keys_a: HashSet<&str> = side_a.iter().map(|(k, _)| k.as_str()).collect();

    let mut rows = Vec::with_capacity(side_a.len() + side_b.len());
    for (k, row_a) in &side_a {
        let row = match lookup_b.get(k.as_str()) {
            Some(row_b) => compare(k, row_a, row_b, pairs, tolerance),
            None => one_sided(k, Some(*row_a), None, pairs),
        };
        rows.push(row);
    }
    for (k, row_b) in side_b.iter().filter(|(k, _)| !keys_a.contains(k.as_str())) {
        rows.push(one_sided(k, None, Some(*row_b), pairs));
    }
    debug!(key, rows = rows.len(), "reconciliation complete");
    Ok(ReconciliationReport { key_column: key.to_string(), rows })
}

/// Rows by normalised key, first occurrence wins. Blank keys are dropped.
fn keyed_rows<'t>(
    table: &'t Table,
    key: &str,
    side: &'static str,
) -> Result<Vec<(String, &'t Row)>, ReconError> {
    if !table.is_empty() && !table.has_column(key) {
        return Err(ReconError::MissingKeyColumn { side, column: key.to_string() });
    }
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        let Some(k) = row.value(key).as_key() else {
            warn!(side, key, "skipping row with blank key");
            continue;
        };
        if !seen.insert(k.clone()) {
            warn!(side, key = %k, "duplicate key, keeping first occurrence");
            continue;
        }
        rows.push((k, row));
    }
    Ok(rows)
}

fn compare(
    key: &str,
    row_a: &Row,
    row_b: &Row,
    pairs: &[FieldPair],
    tolerance: Decimal,
) -> ReconciliationRow {
    let mut partial = false;
    let mut within = true;
    let fields = pairs
        .iter()
        .map(|pair| {
            let value_a = row_a.decimal(&pair.field_a);
            let value_b = row_b.decimal(&pair.field_b);
            let variance = match (value_a, value_b) {
                (Some(a), Some(b)) => {
                    let diff = a - b;
                    within &= diff.abs() < tolerance;
                    Some(round_money(diff))
                }
                _ => {
                    partial = true;
                    None
                }
            };
            FieldComparison { label: pair.label.clone(), value_a, value_b, variance }
        })
        .collect();
    let status = if partial {
        MatchStatus::PartialData
    } else if within {
        MatchStatus::Match
    } else {
        MatchStatus::Variance
    };
    ReconciliationRow { key: key.to_string(), fields, status }
}

fn one_sided(
    key: &str,
    row_a: Option<&Row>,
    row_b: Option<&Row>,
    pairs: &[FieldPair],
) -> ReconciliationRow {
    let fields = pairs
        .iter()
        .map(|pair| FieldComparison {
            label: pair.label.clone(),
            value_a: row_a.and_then(|r| r.decimal(&pair.field_a)),
            value_b: row_b.and_then(|r| r.decimal(&pair.field_b)),
            variance: None,
        })
        .collect();
    ReconciliationRow { key: key.to_string(), fields, status: MatchStatus::DataMissing }
}

#[cfg(test)]
mod tests {
    use altoro_domain::constants::VARIANCE_TOLERANCE;
    use altoro_domain::CellValue;
    use rust_decimal_macros::dec;

    use super::*;

    fn balances(entries: &[(&str, Decimal)]) -> Table {
        let mut table = Table::with_columns(["account_id", "balance"]);
        for (id, balance) in entries {
            table.push(Row::new().with("account_id", *id).with("balance", *balance));
        }
        table
    }

    fn run(a: &Table, b: &Table) -> ReconciliationReport {
        reconcile(a, b, "account_id", &[FieldPair::same("balance")], VARIANCE_TOLERANCE)
            .expect("valid input")
    }

    #[test]
    fn test_sub_cent_difference_matches() {
        let report = run(
            &balances(&[("800002", dec!(100.00))]),
            &balances(&[("800002", dec!(100.005))]),
        );
        assert_eq!(report.rows[0].status, MatchStatus::Match);
    }

    #[test]
    fn test_two_cent_difference_is_variance() {
        let report = run(
            &balances(&[("800002", dec!(100.00))]),
            &balances(&[("800002", dec!(100.02))]),
        );
        let row = &report.rows[0];
        assert_eq!(row.status, MatchStatus::Variance);
        assert_eq!(row.field("balance").and_then(|f| f.variance), Some(dec!(-0.02)));
    }

    #[test]
    fn test_exactly_tolerance_is_variance() {
        let report = run(&balances(&[("1", dec!(10.00))]), &balances(&[("1", dec!(10.01))]));
        assert_eq!(report.rows[0].status, MatchStatus::Variance);
    }

    #[test]
    fn test_one_sided_keys_are_missing_not_zero() {
        let report = run(&balances(&[("800002", dec!(100.00))]), &Table::new());
        let row = report.row("800002").expect("row");
        assert_eq!(row.status, MatchStatus::DataMissing);
        assert_eq!(row.fields[0].value_a, Some(dec!(100.00)));
        assert_eq!(row.fields[0].value_b, None);
        assert_eq!(row.fields[0].variance, None);
    }

    #[test]
    fn test_blank_field_is_partial_data() {
        let mut web = Table::with_columns(["account_id", "balance"]);
        web.push(Row::new().with("account_id", "800002").with("balance", ""));
        let report = run(&balances(&[("800002", dec!(100.00))]), &web);
        assert_eq!(report.rows[0].status, MatchStatus::PartialData);
        assert_eq!(report.rows[0].fields[0].variance, None);
    }

    #[test]
    fn test_unreadable_field_is_partial_data_not_zero() {
        let mut web = Table::with_columns(["account_id", "balance"]);
        web.push(Row::new().with("account_id", "800002").with("balance", "N/A"));
        web.push(Row::new().with("account_id", "800003").with("balance", "1.2.3"));
        let api = balances(&[("800002", dec!(100.00)), ("800003", dec!(50.00))]);

        let report = run(&api, &web);

        for row in &report.rows {
            assert_eq!(row.status, MatchStatus::PartialData, "{}", row.key);
            assert_eq!(row.fields[0].value_b, None);
            assert_eq!(row.fields[0].variance, None);
        }
    }

    #[test]
    fn test_order_is_a_keys_then_b_only_keys() {
        let a = balances(&[("3", dec!(1)), ("1", dec!(1))]);
        let b = balances(&[("2", dec!(1)), ("1", dec!(1)), ("4", dec!(1))]);
        let keys: Vec<_> = run(&a, &b).rows.into_iter().map(|r| r.key).collect();
        assert_eq!(keys, ["3", "1", "2", "4"]);
    }

    #[test]
    fn test_keys_normalise_numbers_and_duplicates() {
        let mut a = Table::with_columns(["account_id", "balance"]);
        a.push(Row::new().with("account_id", 800002.0).with("balance", "$1,000.00"));
        a.push(Row::new().with("account_id", "800002").with("balance", "5"));
        let b = balances(&[("800002", dec!(1000))]);

        let report = run(&a, &b);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, MatchStatus::Match);
    }

    #[test]
    fn test_self_reconciliation_matches_everywhere() {
        let table = balances(&[("1", dec!(10.10)), ("2", dec!(-4.25)), ("3", dec!(0))]);
        let report = run(&table, &table);
        assert!(report.rows.iter().all(|r| r.status == MatchStatus::Match));
        assert!(report.rows.iter().all(|r| r.fields[0].variance == Some(dec!(0.00))));
    }

    #[test]
    fn test_invalid_inputs() {
        let table = balances(&[("1", dec!(1))]);
        assert_eq!(
            reconcile(&table, &table, "account_id", &[FieldPair::same("balance")], dec!(-0.01)),
            Err(ReconError::NegativeTolerance(dec!(-0.01)))
        );
        assert_eq!(
            reconcile(&table, &table, "account_id", &[], dec!(0.01)),
            Err(ReconError::NoFieldPairs)
        );
        assert!(matches!(
            reconcile(&table, &table, "id", &[FieldPair::same("balance")], dec!(0.01)),
            Err(ReconError::MissingKeyColumn { side: "A", .. })
        ));
    }

    #[test]
    fn test_labelled_table_layout() {
        let report = run(
            &balances(&[("800002", dec!(100.00))]),
            &balances(&[("800002", dec!(99.00))]),
        );
        let table = report.to_labelled_table("api", "web");
        assert_eq!(
            table.columns(),
            ["account_id", "balance_api", "balance_web", "balance_variance", "match_status"]
        );
        assert_eq!(table.rows()[0].value("balance_variance"), CellValue::Money(dec!(1.00)));
        assert_eq!(table.rows()[0].value("match_status"), CellValue::text("Variance"));
    }
}
