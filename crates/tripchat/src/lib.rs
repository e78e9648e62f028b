//! Tripchat - a proxy that relays travel-assistant chat turns to Gemini or OpenRouter.

pub mod build_info;
pub mod config;
pub mod handlers;
pub mod llm;
pub mod response;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;
