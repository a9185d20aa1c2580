//! reqwest-backed transport for the Altoro Mutual REST API.

pub mod client;

pub use client::{HttpTransport, HttpTransportBuilder};
