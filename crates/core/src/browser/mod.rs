//! Browser port, its error type and the shared page primitives.

pub mod actions;
pub mod error;
pub mod ports;

pub use actions::PageActions;
pub use error::BrowserError;
pub use ports::{BrowserDriver, BrowserLauncher, Link, SelectOption, Target};
