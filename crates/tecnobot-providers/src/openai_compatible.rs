//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions — blocking or streamed over
//! SSE — for all OpenAI-compatible APIs, plus a companion embedder for the
//! `/embeddings` endpoint. Providers are distinguished only by endpoint URL,
//! auth style, and API key.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use tokio_stream::wrappers::ReceiverStream;

use tecnobot_core::TecnobotConfig;
use tecnobot_core::error::{Result, TecnobotError};
use tecnobot_core::traits::provider::{FragmentStream, GenerateParams, Provider};
use tecnobot_core::traits::Embedder;
use tecnobot_core::types::{Message, ModelInfo, ProviderResponse, Usage};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified chat provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "groq", "openai").
    name: String,
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API (e.g., "https://api.groq.com/openai/v1").
    base_url: String,
    /// Path for chat completions (e.g., "/chat/completions").
    chat_path: String,
    /// Path for listing models (e.g., "/models").
    models_path: String,
    /// Authentication style.
    auth_style: AuthStyle,
    /// Default models to return from `list_models`.
    default_models: Vec<ModelInfo>,
    /// HTTP client.
    client: reqwest::Client,
}

/// Resolve the API key: explicit config value first, then env vars in order.
fn resolve_api_key(config: &TecnobotConfig, env_keys: &[&str]) -> String {
    if !config.api_key.is_empty() {
        config.api_key.clone()
    } else {
        env_keys
            .iter()
            .find_map(|key| std::env::var(key).ok())
            .unwrap_or_default()
    }
}

/// Resolve the base URL: env override first, then the registry default.
/// OLLAMA_HOST-style overrides get "/v1" appended when missing.
fn resolve_base_url(registry: &ProviderConfig) -> String {
    registry
        .base_url_env
        .and_then(|env_key| {
            let val = std::env::var(env_key).ok()?;
            if val.ends_with("/v1") {
                Some(val)
            } else {
                Some(format!("{}/v1", val.trim_end_matches('/')))
            }
        })
        .unwrap_or_else(|| registry.base_url.to_string())
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + TecnobotConfig.
    pub fn from_registry(registry: &ProviderConfig, config: &TecnobotConfig) -> Self {
        let default_models = registry
            .default_models
            .iter()
            .map(|m| m.to_model_info(registry.name))
            .collect();

        Self {
            name: registry.name.to_string(),
            api_key: resolve_api_key(config, registry.env_keys),
            base_url: resolve_base_url(registry),
            chat_path: registry.chat_path.to_string(),
            models_path: registry.models_path.to_string(),
            auth_style: registry.auth_style,
            default_models,
            client: reqwest::Client::new(),
        }
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &TecnobotConfig) -> Self {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            models_path: "/models".to_string(),
            auth_style,
            default_models: vec![],
            client: reqwest::Client::new(),
        }
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    fn check_auth(&self) -> Result<()> {
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(TecnobotError::ApiKeyMissing(self.name.clone()));
        }
        Ok(())
    }

    fn request_body(&self, messages: &[Message], params: &GenerateParams) -> Value {
        json!({
            "model": params.model,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "messages": serde_json::to_value(messages).unwrap_or_default(),
        })
    }

    async fn post_chat(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, self.chat_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        let resp = self.apply_auth(req).send().await.map_err(|e| {
            TecnobotError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TecnobotError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        self.check_auth()?;

        let body = self.request_body(messages, params);
        let resp = self.post_chat(&body).await?;

        // Parse response — standard OpenAI format
        let json: Value = resp
            .json()
            .await
            .map_err(|e| TecnobotError::Http(e.to_string()))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| TecnobotError::Provider("No choices in response".into()))?;

        let content = choice["message"]["content"].as_str().map(String::from);

        let usage = json["usage"].as_object().map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ProviderResponse {
            content,
            finish_reason: choice["finish_reason"].as_str().map(String::from),
            usage,
        })
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<FragmentStream> {
        self.check_auth()?;

        let mut body = self.request_body(messages, params);
        body["stream"] = Value::Bool(true);
        let resp = self.post_chat(&body).await?;

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(32);
        let mut bytes = resp.bytes_stream();
        let provider = self.name.clone();

        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("{provider} stream transport error: {e}");
                        let _ = tx.send(Err(TecnobotError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    match parse_sse_line(&line) {
                        SseEvent::Fragment(text) => {
                            // receiver dropped means the consumer cancelled
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        SseEvent::Done => return,
                        SseEvent::Ignore => {}
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}{}", self.base_url, self.models_path);
        let req = self.client.get(&url);
        let req = self.apply_auth(req);

        match req.send().await {
            Ok(r) if r.status().is_success() => {
                let json: Value = r.json().await.unwrap_or_default();
                let models: Vec<ModelInfo> = json["data"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|m| {
                                Some(ModelInfo {
                                    id: m["id"].as_str()?.to_string(),
                                    name: m["id"].as_str()?.to_string(),
                                    provider: self.name.clone(),
                                    context_length: 4096,
                                    max_output_tokens: Some(4096),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if models.is_empty() {
                    Ok(self.default_models.clone())
                } else {
                    Ok(models)
                }
            }
            _ => Ok(self.default_models.clone()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        if self.auth_style != AuthStyle::None {
            // For cloud providers, just check if the API key is set
            return Ok(!self.api_key.is_empty());
        }

        // For local servers (ollama), try to connect
        let url = format!("{}{}", self.base_url, self.models_path);
        let resp = self.client.get(&url).send().await;
        Ok(resp.is_ok())
    }
}

/// One parsed server-sent-events line.
#[derive(Debug, PartialEq)]
enum SseEvent {
    /// A delta content fragment.
    Fragment(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Blank lines, comments, frames without content.
    Ignore,
}

fn parse_sse_line(line: &str) -> SseEvent {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Ignore;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    match serde_json::from_str::<Value>(data) {
        Ok(frame) => frame["choices"][0]["delta"]["content"]
            .as_str()
            .map(|s| SseEvent::Fragment(s.to_string()))
            .unwrap_or(SseEvent::Ignore),
        Err(_) => SseEvent::Ignore,
    }
}

/// Embedding client for the OpenAI-compatible `/embeddings` endpoint.
///
/// All failures on this path map to `EmbeddingUnavailable`: the caller must
/// never be handed stale vectors in place of an error.
pub struct OpenAiCompatibleEmbedder {
    name: String,
    api_key: String,
    base_url: String,
    embeddings_path: String,
    auth_style: AuthStyle,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleEmbedder {
    pub fn from_registry(
        registry: &ProviderConfig,
        model: &str,
        config: &TecnobotConfig,
    ) -> Self {
        Self {
            name: registry.name.to_string(),
            api_key: resolve_api_key(config, registry.env_keys),
            base_url: resolve_base_url(registry),
            embeddings_path: registry.embeddings_path.to_string(),
            auth_style: registry.auth_style,
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(TecnobotError::EmbeddingUnavailable(format!(
                "API key missing for {}",
                self.name
            )));
        }

        let url = format!("{}{}", self.base_url, self.embeddings_path);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if self.auth_style == AuthStyle::Bearer && !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = req.send().await.map_err(|e| {
            TecnobotError::EmbeddingUnavailable(format!("{} connection failed: {e}", self.name))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TecnobotError::EmbeddingUnavailable(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp.json().await.map_err(|e| {
            TecnobotError::EmbeddingUnavailable(format!("invalid response: {e}"))
        })?;

        let data = json["data"].as_array().ok_or_else(|| {
            TecnobotError::EmbeddingUnavailable("no data array in response".into())
        })?;

        let mut vectors = Vec::with_capacity(data.len());
        for item in data {
            let vector: Vec<f32> = item["embedding"]
                .as_array()
                .ok_or_else(|| {
                    TecnobotError::EmbeddingUnavailable("missing embedding vector".into())
                })?
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            vectors.push(vector);
        }

        tracing::debug!("{}: embedded {} texts", self.name, vectors.len());
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hola"}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Fragment("Hola".into()));
    }

    #[test]
    fn test_parse_sse_done() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseEvent::Done);
    }

    #[test]
    fn test_parse_sse_ignores_blank_and_comments() {
        assert_eq!(parse_sse_line(""), SseEvent::Ignore);
        assert_eq!(parse_sse_line(": keep-alive"), SseEvent::Ignore);
    }

    #[test]
    fn test_parse_sse_ignores_frames_without_content() {
        // role-only first frame and finish frame carry no content delta
        let role = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        let finish = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_sse_line(role), SseEvent::Ignore);
        assert_eq!(parse_sse_line(finish), SseEvent::Ignore);
    }

    #[test]
    fn test_parse_sse_ignores_malformed_json() {
        assert_eq!(parse_sse_line("data: {broken"), SseEvent::Ignore);
    }

    #[test]
    fn test_custom_endpoint_strips_prefix() {
        let config = TecnobotConfig::default();
        let provider =
            OpenAiCompatibleProvider::custom("custom:https://my-server.com/v1/", &config);
        assert_eq!(provider.base_url, "https://my-server.com/v1");
        assert_eq!(provider.name, "custom");
    }

    #[test]
    fn test_chat_requires_api_key_for_bearer_providers() {
        let registry = crate::provider_registry::get_provider_config("groq").unwrap();
        let config = TecnobotConfig::default();
        let provider = OpenAiCompatibleProvider::from_registry(registry, &config);
        // only meaningful when no ambient key is configured
        if provider.api_key.is_empty() {
            assert!(matches!(
                provider.check_auth(),
                Err(TecnobotError::ApiKeyMissing(_))
            ));
        }
    }

    #[test]
    fn test_request_body_shape() {
        let config = TecnobotConfig::default();
        let provider = OpenAiCompatibleProvider::custom("custom:http://x/v1", &config);
        let messages = vec![Message::system("sys"), Message::user("hola")];
        let params = GenerateParams {
            model: "m".into(),
            temperature: 0.5,
            max_tokens: 1024,
        };
        let body = provider.request_body(&messages, &params);
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hola");
    }
}
