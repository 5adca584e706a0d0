//! Error types for the engine.

use std::fmt;

use listsync_core::{MemberKey, Operation};
use listsync_view::ViewError;
use thiserror::Error;

/// Signals from the upstream identity and membership APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The caller is being rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// The member does not exist upstream (HTTP 404).
    #[error("not found")]
    NotFound,

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success response.
    #[error("upstream status {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Map an HTTP status and body to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 => ApiError::RateLimited,
            404 => ApiError::NotFound,
            _ => ApiError::Status {
                status,
                message: message.into(),
            },
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::NotFound => false,
        }
    }

    /// The HTTP status this error corresponds to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited => Some(429),
            ApiError::NotFound => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(_) => None,
        }
    }
}

/// Failure to turn a member key into a stable id.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    /// The member does not exist. Never retried.
    #[error("not found")]
    NotFound { key: MemberKey },

    /// Every attempt was rate limited or failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        key: MemberKey,
        attempts: u32,
        last: ApiError,
    },

    /// The API refused the lookup for a non-transient reason.
    #[error("lookup rejected: {error}")]
    Rejected { key: MemberKey, error: ApiError },
}

impl ResolutionError {
    pub fn key(&self) -> &MemberKey {
        match self {
            ResolutionError::NotFound { key }
            | ResolutionError::RetriesExhausted { key, .. }
            | ResolutionError::Rejected { key, .. } => key,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolutionError::NotFound { .. })
    }
}

/// A membership change the upstream API refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct MutationError {
    pub operation: Operation,
    pub status: Option<u16>,
    pub message: String,
}

impl MutationError {
    pub fn from_api(operation: Operation, error: &ApiError) -> Self {
        Self {
            operation,
            status: error.status(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "failed to {} member: {} - {}", self.operation.as_str(), status, self.message),
            None => write!(f, "failed to {} member: {}", self.operation.as_str(), self.message),
        }
    }
}

/// A snapshot provider could not produce a snapshot at all.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("view error: {0}")]
    View(#[from] ViewError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ResolutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from_status(429, "slow down"), ApiError::RateLimited);
        assert_eq!(ApiError::from_status(404, ""), ApiError::NotFound);
        assert!(ApiError::from_status(503, "unavailable").is_transient());
        assert!(!ApiError::from_status(403, "forbidden").is_transient());
        assert!(ApiError::Network("reset".into()).is_transient());
        assert!(!ApiError::NotFound.is_transient());
    }

    #[test]
    fn test_not_found_message() {
        let err = ResolutionError::NotFound {
            key: MemberKey::new("ghost"),
        };
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.key().as_str(), "ghost");
    }

    #[test]
    fn test_mutation_error_display() {
        let err = MutationError::from_api(
            Operation::Add,
            &ApiError::Status {
                status: 500,
                message: "boom".into(),
            },
        );
        assert_eq!(err.status, Some(500));
        assert_eq!(err.to_string(), "failed to add member: 500 - upstream status 500: boom");

        let err = MutationError::from_api(Operation::Remove, &ApiError::Network("reset".into()));
        assert_eq!(err.to_string(), "failed to remove member: network error: reset");
    }
}
