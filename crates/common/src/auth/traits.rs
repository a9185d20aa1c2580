//! Authentication seam used by [`TokenManager`](super::TokenManager).

use std::error::Error;

use async_trait::async_trait;

use super::types::AuthToken;
use crate::error::ErrorClassification;

/// Obtains a fresh token from whatever issues them.
///
/// Failures must classify rejected credentials as
/// [`FailureKind::Authentication`](crate::error::FailureKind::Authentication)
/// and connectivity problems as `Transient`, so callers can tell them apart.
#[async_trait]
pub trait Authenticator: Send + Sync {
    type Error: ErrorClassification + Error + Send + Sync + 'static;

    async fn authenticate(&self) -> Result<AuthToken, Self::Error>;
}

#[async_trait]
impl<A: Authenticator + ?Sized> Authenticator for std::sync::Arc<A> {
    type Error = A::Error;

    async fn authenticate(&self) -> Result<AuthToken, Self::Error> {
        (**self).authenticate().await
    }
}
