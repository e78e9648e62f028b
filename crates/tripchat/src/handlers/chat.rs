//! Chat relay handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, warn};
use tripchat_types::{Provider, RelayResponse};

use crate::llm::ChatRequest;
use crate::response;
use crate::server::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Incoming body before validation. Fields stay loose so each problem maps
/// to its own 400 message.
#[derive(Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return response::bad_request(rejection.body_text()).into_response(),
    };

    let Some(message) = body.message.filter(|m| !m.trim().is_empty()) else {
        return response::bad_request("Message is required").into_response();
    };

    let provider = match body
        .provider
        .as_deref()
        .unwrap_or(Provider::default().as_str())
        .parse::<Provider>()
    {
        Ok(provider) => provider,
        Err(e) => {
            debug!(error = %e, "Rejected chat request");
            return response::bad_request("Invalid provider").into_response();
        }
    };

    let Some(adapter) = state.providers.get(&provider) else {
        warn!(%provider, "Chat request for unconfigured provider");
        return response::internal_error(format!(
            "Provider '{}' is not configured. Set {}.",
            provider,
            provider.api_key_env()
        ))
        .into_response();
    };

    let request = ChatRequest::new(message).with_model(body.model);
    debug!(%provider, model = ?request.model, "Dispatching chat request");

    match adapter.call(&request).await {
        Ok(text) => (StatusCode::OK, Json(RelayResponse::reply(text))).into_response(),
        Err(e) => {
            error!(%provider, status = ?e.status(), error = %e, "Upstream call failed");
            response::internal_error(e.to_string()).into_response()
        }
    }
}

/// Any other method on /api/chat.
pub async fn method_not_allowed() -> Response {
    response::method_not_allowed().into_response()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use axum::routing::post;
    use http_body_util::BodyExt;
    use reqwest::Client;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::{GeminiConfig, OpenRouterConfig, SamplingConfig};
    use crate::llm::{
        GeminiProvider, LLMError, LLMProvider, OpenRouterProvider, ProviderRegistry,
    };
    use crate::server::{AppState, build_app};
    use crate::test_support::spawn_upstream;

    use super::*;

    /// Adapter returning a canned outcome and counting calls.
    struct CannedProvider {
        provider: Provider,
        reply: Result<&'static str, u16>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl CannedProvider {
        fn ok(provider: Provider, text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: Ok(text),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(provider: Provider, status: u16) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: Err(status),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn call(&self, request: &ChatRequest) -> Result<String, LLMError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.reply {
                Ok(text) => match &request.model {
                    Some(model) => Ok(format!("{text} [{model}]")),
                    None => Ok(text.to_string()),
                },
                Err(status) => Err(LLMError::Api {
                    provider: self.provider,
                    status,
                    detail: None,
                }),
            }
        }
    }

    fn app_from(providers: ProviderRegistry) -> Router {
        build_app(AppState { providers }, 30)
    }

    fn app_with<P: LLMProvider + 'static>(provider: Provider, adapter: Arc<P>) -> Router {
        let mut providers = ProviderRegistry::new();
        providers.register(provider, adapter);
        app_from(providers)
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    // --- Validation ---

    #[tokio::test]
    async fn successful_adapter_reply_is_returned() {
        for provider in Provider::ALL {
            let adapter = CannedProvider::ok(provider, "Pack light.");
            let app = app_with(provider, adapter.clone());

            let (status, body) = send(
                app,
                post_json(json!({"message": "What should I pack?", "provider": provider.as_str()})),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"response": "Pack light."}));
            assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn provider_defaults_to_gemini() {
        let gemini = CannedProvider::ok(Provider::Gemini, "from gemini");
        let openrouter = CannedProvider::ok(Provider::OpenRouter, "from openrouter");
        let mut providers = ProviderRegistry::new();
        providers.register(Provider::Gemini, gemini);
        providers.register(Provider::OpenRouter, openrouter.clone());
        let app = app_from(providers);

        let (status, body) = send(app.clone(), post_json(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "from gemini");

        let (status, body) =
            send(app, post_json(json!({"message": "hi", "provider": null}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "from gemini");
        assert_eq!(openrouter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_or_empty_message_is_rejected() {
        let adapter = CannedProvider::ok(Provider::Gemini, "unused");
        let app = app_with(Provider::Gemini, adapter.clone());

        for body in [
            json!({}),
            json!({"message": ""}),
            json!({"message": "   "}),
            json!({"message": null, "provider": "gemini"}),
            json!({"provider": "openrouter"}),
            json!({"message": "", "provider": "foo"}),
        ] {
            let (status, response) = send(app.clone(), post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({"error": "Message is required"}));
        }
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let app = app_with(
            Provider::Gemini,
            CannedProvider::ok(Provider::Gemini, "unused"),
        );

        for provider in ["foo", "Gemini", "openai", ""] {
            let (status, body) = send(
                app.clone(),
                post_json(json!({"message": "hi", "provider": provider})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "Invalid provider"}));
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app_from(ProviderRegistry::new());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_closed() {
        let app = app_with(
            Provider::Gemini,
            CannedProvider::ok(Provider::Gemini, "unused"),
        );

        let (status, body) = send(
            app,
            post_json(json!({"message": "hi", "provider": "openrouter"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "Provider 'openrouter' is not configured. Set OPENROUTER_API_KEY."
        );
    }

    #[tokio::test]
    async fn model_is_forwarded_to_adapter() {
        let adapter = CannedProvider::ok(Provider::OpenRouter, "ok");
        let app = app_with(Provider::OpenRouter, adapter);

        let (status, body) = send(
            app,
            post_json(json!({"message": "hi", "provider": "openrouter", "model": "openai/gpt-4-turbo"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "ok [openai/gpt-4-turbo]");
    }

    // --- Methods and CORS ---

    #[tokio::test]
    async fn non_post_methods_are_rejected() {
        let app = app_from(ProviderRegistry::new());
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let request = Request::builder()
                .method(method.clone())
                .uri("/api/chat")
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(app.clone(), request).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(body, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn options_returns_cors_headers() {
        let app = app_from(ProviderRegistry::new());

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let bare = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();

        for request in [preflight, bare] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let headers = response.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
                .to_str()
                .unwrap()
                .to_string();
            for method in ["GET", "POST", "OPTIONS"] {
                assert!(methods.contains(method), "{methods}");
            }
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                    .to_str()
                    .unwrap()
                    .to_ascii_lowercase(),
                "content-type"
            );
        }
    }

    #[tokio::test]
    async fn post_responses_carry_allow_origin() {
        let app = app_with(Provider::Gemini, CannedProvider::ok(Provider::Gemini, "hello"));
        let response = app
            .oneshot(post_json(json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    // --- Upstream failures ---

    #[tokio::test]
    async fn adapter_failure_becomes_500_with_status() {
        for (provider, status) in [(Provider::Gemini, 503), (Provider::OpenRouter, 429)] {
            let adapter = CannedProvider::failing(provider, status);
            let app = app_with(provider, adapter.clone());

            let (code, body) = send(
                app,
                post_json(json!({"message": "hi", "provider": provider.as_str()})),
            )
            .await;
            assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(
                body["error"].as_str().unwrap().contains(&status.to_string()),
                "{body}"
            );
            // No retries.
            assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn slow_upstream_hits_request_timeout() {
        let adapter = Arc::new(CannedProvider {
            provider: Provider::Gemini,
            reply: Ok("too late"),
            delay: Some(Duration::from_secs(10)),
            calls: AtomicUsize::new(0),
        });
        let mut providers = ProviderRegistry::new();
        providers.register(Provider::Gemini, adapter);
        let app = build_app(AppState { providers }, 1);

        let response = app
            .oneshot(post_json(json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    // --- End-to-end through real adapters ---

    #[tokio::test]
    async fn gemini_scenario_returns_candidate_text() {
        let upstream = Router::new().route(
            "/models/{model}",
            post(|| async {
                Json(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "Try the Amalfi Coast."}], "role": "model"},
                        "finishReason": "STOP"
                    }]
                }))
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let gemini = GeminiProvider::new(
            Client::new(),
            &GeminiConfig {
                base_url,
                ..GeminiConfig::default()
            },
            "g-key".to_string(),
            SamplingConfig::default(),
        );
        let app = app_with(Provider::Gemini, Arc::new(gemini));

        let (status, body) = send(
            app,
            post_json(json!({"message": "Where should I go in June?", "provider": "gemini"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "Try the Amalfi Coast."}));
    }

    #[tokio::test]
    async fn openrouter_scenario_surfaces_401() {
        let upstream = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "User not found.", "code": 401}})),
                )
            }),
        );
        let base_url = spawn_upstream(upstream).await;
        let openrouter = OpenRouterProvider::new(
            Client::new(),
            &OpenRouterConfig {
                base_url,
                ..OpenRouterConfig::default()
            },
            "sk-or-bad".to_string(),
            SamplingConfig::default(),
        );
        let app = app_with(Provider::OpenRouter, Arc::new(openrouter));

        let (status, body) = send(
            app,
            post_json(json!({"message": "hi", "provider": "openrouter", "model": "openai/gpt-4-turbo"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "OpenRouter API error: 401 - User not found."})
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_500() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gemini = GeminiProvider::new(
            Client::new(),
            &GeminiConfig {
                base_url: format!("http://{addr}"),
                ..GeminiConfig::default()
            },
            "g-key".to_string(),
            SamplingConfig::default(),
        );
        let app = app_with(Provider::Gemini, Arc::new(gemini));

        let (status, body) = send(app, post_json(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Gemini request failed")
        );
    }
}
