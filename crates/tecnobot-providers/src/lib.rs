//! # TecnoBot Providers
//!
//! LLM provider implementations. All supported chat providers (Groq, OpenAI,
//! Ollama) speak the OpenAI wire format and are handled by a single
//! `OpenAiCompatibleProvider`; embeddings go through the companion
//! `OpenAiCompatibleEmbedder`.

pub mod openai_compatible;
pub mod provider_registry;

use std::sync::Arc;

use tecnobot_core::TecnobotConfig;
use tecnobot_core::error::{Result, TecnobotError};
use tecnobot_core::traits::{Embedder, Provider};

/// Create the chat provider named by `config.default_provider`.
pub fn create_provider(config: &TecnobotConfig) -> Result<Box<dyn Provider>> {
    let provider_name = config.default_provider.as_str();

    // Custom endpoint: "custom:https://my-server.com/v1"
    if provider_name.starts_with("custom:") {
        return Ok(Box::new(
            openai_compatible::OpenAiCompatibleProvider::custom(provider_name, config),
        ));
    }

    let registry = provider_registry::get_provider_config(provider_name)
        .ok_or_else(|| TecnobotError::ProviderNotFound(provider_name.into()))?;
    Ok(Box::new(
        openai_compatible::OpenAiCompatibleProvider::from_registry(registry, config),
    ))
}

/// Create the embedding provider named by `config.retrieval.embedding_provider`.
pub fn create_embedder(config: &TecnobotConfig) -> Result<Arc<dyn Embedder>> {
    let provider_name = config.retrieval.embedding_provider.as_str();
    let registry = provider_registry::get_provider_config(provider_name)
        .ok_or_else(|| TecnobotError::ProviderNotFound(provider_name.into()))?;
    Ok(Arc::new(
        openai_compatible::OpenAiCompatibleEmbedder::from_registry(
            registry,
            &config.retrieval.embedding_model,
            config,
        ),
    ))
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}
