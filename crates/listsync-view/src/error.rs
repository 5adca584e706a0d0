//! Error types for the view module.

use thiserror::Error;

/// Errors a list view can report while preparing for collection.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view is not showing the expected list (e.g. wrong page).
    #[error("view unavailable: {0}")]
    Unavailable(String),
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
