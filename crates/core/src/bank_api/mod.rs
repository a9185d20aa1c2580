//! Altoro Mutual REST API: transport port, errors, response decoding and
//! the retrying, token-managing client.

pub mod client;
pub mod error;
pub mod parse;
pub mod ports;

pub use client::{AltoroApi, TransportAuthenticator};
pub use error::ApiError;
pub use ports::{bearer_token, ApiTransport, Method};
