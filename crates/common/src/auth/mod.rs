//! Bearer-token lifecycle.
//!
//! ```text
//! caller ──► TokenManager::current_token()
//!                 │  fresh?  ──yes──► Arc<AuthToken>
//!                 │  no
//!                 └──► Authenticator::authenticate() ──► replace cached token
//! ```
//!
//! The manager never mutates a token in place. A refresh builds a new
//! [`AuthToken`] and swaps the `Arc`, so callers holding the old one keep a
//! consistent value.

pub mod token_manager;
pub mod traits;
pub mod types;

pub use token_manager::{TokenManager, DEFAULT_REFRESH_MARGIN};
pub use traits::Authenticator;
pub use types::{AuthToken, Credentials, DEFAULT_TOKEN_TTL};
