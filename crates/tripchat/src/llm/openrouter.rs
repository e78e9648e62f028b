//! OpenRouter provider (OpenAI-compatible chat completions).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tripchat_types::Provider;

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::ChatRequest;
use crate::config::{OpenRouterConfig, SamplingConfig};

/// OpenRouter provider authenticated with a bearer token.
pub struct OpenRouterProvider {
    client: Client,
    base_url: String,
    default_model: String,
    referer: String,
    title: String,
    api_key: String,
    sampling: SamplingConfig,
}

impl OpenRouterProvider {
    #[must_use]
    pub fn new(
        client: Client,
        config: &OpenRouterConfig,
        api_key: String,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            api_key,
            sampling,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    async fn call(&self, request: &ChatRequest) -> Result<String, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let body = to_request(model, &request.message, self.sampling);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .map_err(LLMError::request(Provider::OpenRouter))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Api {
                provider: Provider::OpenRouter,
                status,
                detail: Some(error_detail(&body)),
            });
        }

        let text = response
            .text()
            .await
            .map_err(LLMError::request(Provider::OpenRouter))?;
        extract_content(&text)
    }
}

// --- OpenRouter format types and conversions ---

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are a helpful travel assistant for a trip planning website called Travel Craft. \
    Answer questions in a friendly and helpful manner.";

fn to_request<'a>(model: &'a str, message: &'a str, sampling: SamplingConfig) -> Request<'a> {
    Request {
        model,
        messages: [
            Message {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            Message {
                role: "user",
                content: message,
            },
        ],
        max_tokens: sampling.max_output_tokens,
        temperature: sampling.temperature,
    }
}

/// Provider's own error message, or "Unknown error" when the body has none.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Unknown error".to_string())
}

fn extract_content(body: &str) -> Result<String, LLMError> {
    let invalid = || LLMError::InvalidResponse {
        provider: Provider::OpenRouter,
    };

    let response: Response = serde_json::from_str(body).map_err(|e| {
        warn!(provider = "openrouter", error = %e, "Unparseable response body");
        invalid()
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(invalid)
}
