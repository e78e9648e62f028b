//! LLM provider trait.

use async_trait::async_trait;

use super::error::LLMError;
use super::types::ChatRequest;

/// A provider adapter: plain text in, the provider's reply text out.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one message upstream and return the extracted reply text.
    async fn call(&self, request: &ChatRequest) -> Result<String, LLMError>;
}
