//! Provider registry for managing LLM provider instances.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};
use tripchat_types::Provider;

use super::gemini::GeminiProvider;
use super::openrouter::OpenRouterProvider;
use super::provider::LLMProvider;
use crate::config::Config;

/// Registry of LLM providers, keyed by provider type.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize providers from config, with API keys from environment variables.
    ///
    /// A provider without a key is left unregistered, so requests for it fail
    /// closed instead of reaching upstream unauthenticated.
    pub fn from_config(config: &Config) -> Self {
        Self::from_keys(config, |provider| std::env::var(provider.api_key_env()).ok())
    }

    /// Like [`from_config`](Self::from_config), with keys resolved by `lookup`.
    pub fn from_keys(config: &Config, lookup: impl Fn(Provider) -> Option<String>) -> Self {
        let client = Client::new();
        let mut registry = Self::new();

        let key_for = |provider: Provider| lookup(provider).filter(|k| !k.trim().is_empty());

        // Gemini
        if let Some(api_key) = key_for(Provider::Gemini) {
            let provider = GeminiProvider::new(
                client.clone(),
                &config.providers.gemini,
                api_key,
                config.sampling,
            );
            registry.register(Provider::Gemini, Arc::new(provider));
            info!(model = %config.providers.gemini.model, "Registered Gemini provider");
        }

        // OpenRouter
        if let Some(api_key) = key_for(Provider::OpenRouter) {
            let provider = OpenRouterProvider::new(
                client.clone(),
                &config.providers.openrouter,
                api_key,
                config.sampling,
            );
            registry.register(Provider::OpenRouter, Arc::new(provider));
            info!(model = %config.providers.openrouter.model, "Registered OpenRouter provider");
        }

        if registry.is_empty() {
            warn!(
                "No LLM providers configured. \
                Set GEMINI_API_KEY or OPENROUTER_API_KEY."
            );
        }

        registry
    }

    /// Register a provider implementation.
    pub fn register(&mut self, provider: Provider, implementation: Arc<dyn LLMProvider>) {
        self.providers.insert(provider, implementation);
    }

    /// Get a provider by type.
    pub fn get(&self, provider: &Provider) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(provider).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
