use thiserror::Error;
use tracing::error;

use crate::address::AddressError;
use crate::database::StoreError;

/// Per-request failure. Display strings are user-facing and never carry
/// store details; those are logged instead.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Address required")]
    AddressRequired,

    #[error("Invalid address: {0}")]
    Decode(#[from] AddressError),

    #[error("Database unavailable")]
    StoreUnavailable(#[source] StoreError),

    #[error("Internal server error")]
    Store(#[source] StoreError),
}

impl QueryError {
    /// Caller-side mistakes, as opposed to server-side failures
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::AddressRequired | QueryError::Decode(_))
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Store lookup failed");
        if err.is_unavailable() {
            QueryError::StoreUnavailable(err)
        } else {
            QueryError::Store(err)
        }
    }
}
