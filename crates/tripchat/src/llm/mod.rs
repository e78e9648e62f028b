//! LLM provider adapters for single-turn chat.

mod error;
mod gemini;
mod openrouter;
mod provider;
mod registry;
mod types;

pub use error::LLMError;
pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;
pub use provider::LLMProvider;
pub use registry::ProviderRegistry;
pub use types::ChatRequest;
