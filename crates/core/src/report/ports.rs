//! Output port for tabular results.

use altoro_domain::{Result, Table};
use async_trait::async_trait;

/// Destination for named sheets of tabular data.
///
/// Writing a sheet replaces any sheet of the same name and keeps the
/// others. Formatting is the sink's business; callers hand over data only.
#[async_trait]
pub trait TableSink: Send + Sync {
    async fn write_table(&self, sheet: &str, table: &Table) -> Result<()>;

    /// A sheet written earlier in this process, if any.
    async fn read_table(&self, sheet: &str) -> Result<Option<Table>>;

    /// Sheet names in creation order.
    async fn sheet_names(&self) -> Vec<String>;
}
