//! Conversions from the port errors into [`AltoroError`].

use altoro_domain::AltoroError;

use crate::bank_api::ApiError;
use crate::browser::BrowserError;
use crate::reconciliation::ReconError;

impl From<BrowserError> for AltoroError {
    fn from(error: BrowserError) -> Self {
        Self::Browser(error.to_string())
    }
}

impl From<ApiError> for AltoroError {
    fn from(error: ApiError) -> Self {
        if error.is_auth() {
            Self::Auth(error.to_string())
        } else {
            Self::Api(error.to_string())
        }
    }
}

impl From<ReconError> for AltoroError {
    fn from(error: ReconError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}
