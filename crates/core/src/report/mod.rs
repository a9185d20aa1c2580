//! Where results go: the [`TableSink`] port and helpers shared by sinks.

pub mod memory;
pub mod ports;
pub mod sheet;

pub use memory::InMemorySink;
pub use ports::TableSink;
pub use sheet::{stack_sections, validate_sheet_name, SECTION_COLUMN};
