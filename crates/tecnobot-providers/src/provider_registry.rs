//! Provider registry — maps provider names to endpoint configurations.
//!
//! All supported providers are OpenAI-compatible and defined here as static
//! config entries; they differ only in endpoint URL, auth style and API key.

use tecnobot_core::types::ModelInfo;

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Static model definition for a provider.
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub id: &'static str,
    pub name: &'static str,
    pub context_length: u32,
    pub max_output_tokens: Option<u32>,
}

impl ModelDef {
    pub fn to_model_info(&self, provider: &str) -> ModelInfo {
        ModelInfo {
            id: self.id.into(),
            name: self.name.into(),
            provider: provider.into(),
            context_length: self.context_length,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub name: &'static str,
    /// Base URL for the API.
    pub base_url: &'static str,
    /// Path for chat completions (appended to base_url).
    pub chat_path: &'static str,
    /// Path for the embeddings endpoint (appended to base_url).
    pub embeddings_path: &'static str,
    /// Path for listing models (appended to base_url).
    pub models_path: &'static str,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    /// How to send auth credentials.
    pub auth_style: AuthStyle,
    /// Environment variable to override the base URL (e.g., OLLAMA_HOST).
    pub base_url_env: Option<&'static str>,
    /// Default models to return from `list_models`.
    pub default_models: &'static [ModelDef],
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static GROQ_MODELS: &[ModelDef] = &[
    ModelDef {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B",
        context_length: 128000,
        max_output_tokens: Some(32768),
    },
    ModelDef {
        id: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B",
        context_length: 128000,
        max_output_tokens: Some(8192),
    },
    ModelDef {
        id: "mixtral-8x7b-32768",
        name: "Mixtral 8x7B",
        context_length: 32768,
        max_output_tokens: Some(8192),
    },
];

static OPENAI_MODELS: &[ModelDef] = &[
    ModelDef {
        id: "gpt-4o",
        name: "GPT-4o",
        context_length: 128000,
        max_output_tokens: Some(4096),
    },
    ModelDef {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        context_length: 128000,
        max_output_tokens: Some(4096),
    },
];

static OLLAMA_MODELS: &[ModelDef] = &[ModelDef {
    id: "llama3.2",
    name: "Llama 3.2 (Ollama)",
    context_length: 4096,
    max_output_tokens: Some(4096),
}];

// ─── Registry ────────────────────────────────────────────────────────────────

/// All known providers.
static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["GROQ_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_models: GROQ_MODELS,
    },
    ProviderConfig {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: Some("OPENAI_API_BASE"),
        default_models: OPENAI_MODELS,
    },
    ProviderConfig {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("OLLAMA_HOST"),
        default_models: OLLAMA_MODELS,
    },
];

/// Look up a provider config by name.
pub fn get_provider_config(name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name == name)
}

/// List all known provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}
