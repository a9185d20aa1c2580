//! Generic tabular data exchanged between workflows, the reconciliation
//! engine and the workbook sink.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::money::try_parse_money;

/// One cell of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Money(Decimal),
    Bool(bool),
    #[default]
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell.
    ///
    /// Text goes through the money parser, so `"$1,234.56"` and `"(12.00)"`
    /// convert. Text without digits (`"N/A"`, `"-"`) or that does not parse,
    /// blank text, `Empty`, `NaN` and booleans yield `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Money(d) => Some(*d),
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Number(n) => Decimal::try_from(*n).ok(),
            Self::Text(s) if s.chars().any(|c| c.is_ascii_digit()) => try_parse_money(s),
            _ => None,
        }
    }

    /// Text rendering used for join keys and display.
    ///
    /// Integral floats drop the fraction, so `800002.0` renders as `800002`.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Integer(i) => Some(i.to_string()),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                n.to_i64().map(|i| i.to_string()).or_else(|| Some(n.to_string()))
            }
            Self::Number(n) if n.is_finite() => Some(n.to_string()),
            Self::Money(d) => Some(d.normalize().to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Money(d) => write!(f, "{:.2}", d),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Money(value)
    }
}

impl From<Option<Decimal>> for CellValue {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::Empty, Self::Money)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Number(value as f64), Self::Integer)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered column-to-value mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Insert or replace the value for `column`, keeping its position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }

    /// Value for `column`, or `Empty` when the row has none.
    pub fn value(&self, column: &str) -> CellValue {
        self.get(column).cloned().unwrap_or_default()
    }

    pub fn decimal(&self, column: &str) -> Option<Decimal> {
        self.get(column).and_then(CellValue::as_decimal)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some((name, _)) = self.cells.iter_mut().find(|(name, _)| name == from) {
            *name = to.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered columns plus ordered rows.
///
/// Rows may omit columns; missing cells read as [`CellValue::Empty`].
/// Pushing a row with an unseen column appends that column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push(row);
        }
        table
    }

    pub fn push(&mut self, row: Row) {
        for column in row.columns() {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declare a column, e.g. before filling it through [`rows_mut`](Self::rows_mut).
    pub fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// Rename a column everywhere. A no-op when `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(name) = self.columns.iter_mut().find(|c| *c == from) {
            *name = to.to_string();
            for row in &mut self.rows {
                row.rename(from, to);
            }
        }
    }

    /// Append another table below this one, merging column lists.
    pub fn append(&mut self, other: Self) {
        for column in other.columns {
            if !self.has_column(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Cell grid in column order, for writers.
    pub fn grid(&self) -> impl Iterator<Item = Vec<CellValue>> + '_ {
        self.rows.iter().map(|row| self.columns.iter().map(|c| row.value(c)).collect())
    }
}
