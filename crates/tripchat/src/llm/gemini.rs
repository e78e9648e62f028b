//! Google Gemini provider (`generateContent` API).
//!
//! The user message is wrapped in the travel-assistant preamble and sent as a
//! single-turn request. The reply lives at `candidates[0].content.parts[0].text`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tripchat_types::Provider;

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::ChatRequest;
use crate::config::{GeminiConfig, SamplingConfig};

/// Gemini provider authenticated with an API key header.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    sampling: SamplingConfig,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(
        client: Client,
        config: &GeminiConfig,
        api_key: String,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            sampling,
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn call(&self, request: &ChatRequest) -> Result<String, LLMError> {
        // Model selection is fixed by config for Gemini.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = to_request(&request.message, self.sampling);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(LLMError::request(Provider::Gemini))?;

        if !response.status().is_success() {
            return Err(LLMError::Api {
                provider: Provider::Gemini,
                status: response.status().as_u16(),
                detail: None,
            });
        }

        let text = response
            .text()
            .await
            .map_err(LLMError::request(Provider::Gemini))?;
        extract_text(&text)
    }
}

// --- Gemini format types and conversions ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

const PREAMBLE: &str = "You are a helpful travel assistant for a trip planning website called Travel Craft. \
    Answer the user's question in a friendly and helpful manner.";

fn to_request(message: &str, sampling: SamplingConfig) -> Request {
    let prompt = format!("{PREAMBLE} User question: {message}");

    Request {
        contents: vec![Content {
            parts: vec![Part { text: Some(prompt) }],
        }],
        generation_config: GenerationConfig {
            temperature: sampling.temperature,
            max_output_tokens: sampling.max_output_tokens,
        },
    }
}

fn extract_text(body: &str) -> Result<String, LLMError> {
    let invalid = || LLMError::InvalidResponse {
        provider: Provider::Gemini,
    };

    let response: Response = serde_json::from_str(body).map_err(|e| {
        warn!(provider = "gemini", error = %e, "Unparseable response body");
        invalid()
    })?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.is_empty())
        .ok_or_else(invalid)
}
