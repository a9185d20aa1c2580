//! Sink that keeps sheets in memory.

use altoro_domain::{Result, Table};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::ports::TableSink;
use super::sheet::validate_sheet_name;

/// Sheets held in creation order. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    sheets: Mutex<Vec<(String, Table)>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous lookup for assertions.
    pub fn sheet(&self, name: &str) -> Option<Table> {
        self.sheets.lock().iter().find(|(n, _)| n == name).map(|(_, t)| t.clone())
    }
}

#[async_trait]
impl TableSink for InMemorySink {
    async fn write_table(&self, sheet: &str, table: &Table) -> Result<()> {
        validate_sheet_name(sheet)?;
        let mut sheets = self.sheets.lock();
        match sheets.iter_mut().find(|(n, _)| n == sheet) {
            Some((_, existing)) => *existing = table.clone(),
            None => sheets.push((sheet.to_string(), table.clone())),
        }
        debug!(sheet, rows = table.len(), "sheet stored");
        Ok(())
    }

    async fn read_table(&self, sheet: &str) -> Result<Option<Table>> {
        Ok(self.sheet(sheet))
    }

    async fn sheet_names(&self) -> Vec<String> {
        self.sheets.lock().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use altoro_domain::Row;

    use super::*;

    #[tokio::test]
    async fn test_rewrite_replaces_and_keeps_order() {
        let sink = InMemorySink::new();
        let first = Table::from_rows([Row::new().with("a", 1_i64)]);
        sink.write_table("First", &first).await.expect("write");
        sink.write_table("Second", &Table::new()).await.expect("write");
        sink.write_table("First", &Table::new()).await.expect("rewrite");

        assert_eq!(sink.sheet_names().await, ["First", "Second"]);
        assert!(sink.read_table("First").await.expect("read").is_some_and(|t| t.is_empty()));
        assert!(sink.read_table("Missing").await.expect("read").is_none());
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let sink = InMemorySink::new();
        assert!(sink.write_table("bad:name", &Table::new()).await.is_err());
    }
}
