//! Chat completion provider trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::types::{Message, ModelInfo, ProviderResponse};

/// Generation parameters for a completion call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A lazy, finite, non-restartable sequence of response text fragments.
///
/// The consumer concatenates fragments in arrival order. The sequence may
/// terminate early (provider cancellation or transport loss); whatever
/// arrived by then is the final answer.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A chat completion provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "groq", "openai", "ollama").
    fn name(&self) -> &str;

    /// Run a blocking chat completion over an ordered message list.
    async fn chat(&self, messages: &[Message], params: &GenerateParams)
    -> Result<ProviderResponse>;

    /// Run a streaming chat completion, yielding text fragments as they arrive.
    async fn chat_stream(
        &self,
        messages: &[Message],
        params: &GenerateParams,
    ) -> Result<FragmentStream>;

    /// List models available from this provider.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Cheap reachability/credentials check.
    async fn health_check(&self) -> Result<bool>;
}
