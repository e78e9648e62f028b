//! HTTP relay to the tripchat proxy.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use tripchat_types::{RelayRequest, RelayResponse};

use crate::error::RelayError;

/// Something that can deliver one user message and return the reply text.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<String, RelayError>;
}

/// Relay that POSTs to `{base_url}/api/chat`.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/chat", base_url.as_ref().trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Relay for RelayClient {
    async fn send(&self, request: &RelayRequest) -> Result<String, RelayError> {
        if request.message.trim().is_empty() {
            return Err(RelayError::Validation);
        }

        debug!(provider = %request.provider, model = ?request.model, "Relaying message");
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<RelayResponse>(&body) {
                Ok(RelayResponse::Error { error }) => error,
                _ => format!("Server error: {}", status.as_u16()),
            };
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<RelayResponse>(&body) {
            Ok(RelayResponse::Reply { response }) => Ok(response),
            _ => Err(RelayError::InvalidResponse),
        }
    }
}
