//! Error types for the ListSync facade.

use listsync_core::{CollectionId, ConfigError};
use listsync_engine::CollectError;
use thiserror::Error;

/// Errors that can occur before a sync run starts.
///
/// Once a run executes, failures are reported in its
/// [`SyncResult`](listsync_core::SyncResult) instead.
#[derive(Debug, Error)]
pub enum ListSyncError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Another run against the same collection is still alive.
    #[error("a sync run for collection {0} is already in progress")]
    TargetBusy(CollectionId),

    /// A preview could not collect one of the snapshots.
    #[error("collection error: {0}")]
    Collect(#[from] CollectError),
}

/// Result type for ListSync operations.
pub type Result<T> = std::result::Result<T, ListSyncError>;
