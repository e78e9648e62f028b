//! Relay error types.

use thiserror::Error;

/// Errors that can occur when relaying a turn to the proxy.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Empty input; rejected before any request is made.
    #[error("message must not be empty")]
    Validation,

    /// Another send is still outstanding on this session.
    #[error("a message is already being sent")]
    Busy,

    /// The request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The proxy answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The proxy answered 2xx without a `response` field.
    #[error("unexpected response from server")]
    InvalidResponse,
}
