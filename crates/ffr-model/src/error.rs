//! Model error types.
//!
//! `ModelError` covers malformed static inputs, which are rejected
//! synchronously. `FetchError` describes a failed fetch; it is stored in
//! [`FetcherState`](crate::FetcherState) rather than propagated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised for invalid inputs to the model layer.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Value cannot be fingerprinted because it is not a plain structure.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Paging parameters out of range.
    #[error("invalid paging: page {page_index} of size {page_size}")]
    InvalidPaging { page_index: usize, page_size: usize },

    /// Fetch options could not be parsed.
    #[error("failed to parse fetch options")]
    Config {
        #[source]
        source: toml::de::Error,
    },
}

impl ModelError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidArgument { reason } => {
                format!("The query could not be turned into a request key: {reason}")
            }
            Self::InvalidPaging {
                page_index,
                page_size,
            } => format!(
                "Page {page_index} with {page_size} rows per page is not valid. \
                 Pages start at 1 and must hold at least one row."
            ),
            Self::Config { source } => format!("The fetch options are malformed: {source}"),
        }
    }
}

/// A failed fetch, as reported by the data-access layer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchError {
    /// The transport failed before a response arrived.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The server answered with an error status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded into a record set.
    #[error("decode error: {message}")]
    Decode { message: String },
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Get a user-friendly message suitable for an error indicator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => {
                "The server could not be reached. Check your connection and try again.".to_string()
            }
            Self::Server { status, message } => {
                format!("The server rejected the request ({status}): {message}")
            }
            Self::Decode { .. } => "The server returned data in an unexpected shape.".to_string(),
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
