//! Monetary string parsing.
//!
//! The site renders amounts as `$1,234.56`, negative amounts either as
//! `-$1,234.56` or in accounting form `($1,234.56)`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a monetary string, or `None` when no number can be read from it.
///
/// Currency symbols, thousands separators and whitespace are ignored.
/// Blank input yields zero.
pub fn try_parse_money(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }

    let accounting_negative = trimmed.starts_with('(') && trimmed.ends_with(')');
    let numeric: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if numeric.is_empty() {
        return Some(Decimal::ZERO);
    }

    let amount = Decimal::from_str(&numeric).ok()?;
    Some(if accounting_negative { -amount } else { amount })
}

/// Parse a monetary string, treating unreadable input as zero.
pub fn parse_money(raw: &str) -> Decimal {
    try_parse_money(raw).unwrap_or(Decimal::ZERO)
}

/// Round half away from zero to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
