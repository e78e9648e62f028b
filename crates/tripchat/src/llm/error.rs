//! LLM error types.

use thiserror::Error;
use tripchat_types::Provider;

/// Errors that can occur when calling an upstream LLM provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed before a response arrived
    #[error("{} request failed: {source}", .provider.label())]
    Request {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// API returned a non-success status
    #[error("{} API error: {status}{}", .provider.label(), detail_suffix(.detail))]
    Api {
        provider: Provider,
        status: u16,
        detail: Option<String>,
    },

    /// API answered 2xx but the reply text was not where it should be
    #[error("Invalid response from {} API", .provider.label())]
    InvalidResponse { provider: Provider },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" - {d}"))
        .unwrap_or_default()
}

impl LLMError {
    pub fn request(provider: Provider) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| LLMError::Request { provider, source }
    }

    /// Upstream HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            LLMError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
