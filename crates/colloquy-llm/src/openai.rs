//! `OpenAI` provider implementing the [`Provider`] trait.
//!
//! Calls the Chat Completions endpoint with Bearer auth. Serves as the
//! failover backend in the default wiring; the request shape is the
//! minimal single-message form since prompts arrive fully composed.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error_parsing::{error_from_response, parse_retry_after};
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// `OpenAI` provider configuration.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Model identifier (e.g. `gpt-4o-mini`).
    pub model: String,
    /// API key.
    pub api_key: String,
    /// Base URL override; tests point this at a local mock server.
    pub base_url: Option<String>,
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ── Provider ────────────────────────────────────────────────────────────────

/// `OpenAI` generation backend.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new provider.
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new provider with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build HTTP headers for the request.
    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| ProviderError::Auth {
                message: format!("invalid API key header: {e}"),
            })?,
        );
        Ok(headers)
    }

    /// Build the request body.
    fn build_request(&self, prompt: &str, max_tokens: u32) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
        }
    }

    /// Pull the completion text out of the first choice.
    fn extract_text(response: ChatResponse) -> ProviderResult<String> {
        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(text)
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{base}/v1/chat/completions")
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(provider = "openai", model = %self.config.model))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String> {
        let request = self.build_request(prompt, max_tokens);
        debug!(prompt_len = prompt.len(), max_tokens, "sending OpenAI request");

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), retry_after, &body));
        }

        let parsed: ChatResponse = response.json().await.map_err(ProviderError::Http)?;
        Self::extract_text(parsed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            model: "gpt-4o-mini".into(),
            api_key: "test-key".into(),
            base_url: Some(server.uri()),
        })
    }

    fn completion_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": text}}
            ]
        })
    }

    // ── Metadata ────────────────────────────────────────────────────────

    #[test]
    fn provider_name_and_model() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            model: "gpt-4o-mini".into(),
            api_key: "k".into(),
            base_url: None,
        });
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn headers_carry_bearer_auth() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            model: "m".into(),
            api_key: "secret".into(),
            base_url: None,
        });
        let headers = provider.build_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
    }

    #[test]
    fn request_shape() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            model: "gpt-4o-mini".into(),
            api_key: "k".into(),
            base_url: None,
        });
        let request = provider.build_request("hello", 128);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 128);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    // ── Happy path ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn generate_returns_completion_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Sure thing.")))
            .mount(&server)
            .await;

        let text = provider_for(&server).generate("hi", 64).await.unwrap();
        assert_eq!(text, "Sure thing.");
    }

    // ── Error mapping ───────────────────────────────────────────────────

    #[tokio::test]
    async fn empty_choices_map_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hi", 64).await.unwrap_err();
        assert_matches!(err, ProviderError::Empty);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"error": {"message": "Incorrect API key provided"}});
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(body))
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hi", 64).await.unwrap_err();
        assert_matches!(err, ProviderError::Auth { ref message } if message.contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("{}"))
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hi", 64).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn rate_limit_parses_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_string("{}"),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).generate("hi", 64).await.unwrap_err();
        assert_matches!(err, ProviderError::RateLimited { retry_after_ms: 3000, .. });
    }
}
