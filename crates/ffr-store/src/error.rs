//! Store error types.

use ffr_model::ModelError;
use thiserror::Error;

/// Error returned synchronously from a dispatch.
///
/// Fetch failures never show up here; they are recorded in the list's
/// fetcher state instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The action carried an invalid query or the query could not be fingerprinted.
    #[error("rejected action {action_type}")]
    Rejected {
        action_type: &'static str,
        #[source]
        source: ModelError,
    },
}

impl StoreError {
    pub fn rejected(action_type: &'static str, source: ModelError) -> Self {
        Self::Rejected {
            action_type,
            source,
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { source, .. } => source.user_message(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
