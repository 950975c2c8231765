//! Runtime error types

use thiserror::Error;

use hermes_core::VenueError;
use hermes_services::{PersistenceError, StoreError, SyncError};

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("session {0}: venue returned empty market metadata")]
    MetadataEmpty(String),

    #[error("venue unavailable: {0}")]
    Venue(VenueError),

    #[error("trade store unavailable: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("symbol {0} has no market data store")]
    SymbolUndefined(String),
}

// Cancellation must propagate unchanged, so these conversions cannot be
// derived with #[from].
impl From<VenueError> for EnvironmentError {
    fn from(err: VenueError) -> Self {
        match err {
            VenueError::Cancelled => EnvironmentError::Cancelled,
            other => EnvironmentError::Venue(other),
        }
    }
}

impl From<StoreError> for EnvironmentError {
    fn from(err: StoreError) -> Self {
        EnvironmentError::Store(err)
    }
}

impl From<SyncError> for EnvironmentError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Venue(e) => e.into(),
            SyncError::Store(e) => EnvironmentError::Store(e),
            SyncError::Cancelled => EnvironmentError::Cancelled,
        }
    }
}
