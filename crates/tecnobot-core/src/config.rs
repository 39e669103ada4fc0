//! TecnoBot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TecnobotConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_api_key() -> String {
    String::new()
}
fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    1024
}

impl Default for TecnobotConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            knowledge: KnowledgeConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl TecnobotConfig {
    /// Load config from the default path (~/.tecnobot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::TecnobotError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::TecnobotError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::TecnobotError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tecnobot")
            .join("config.toml")
    }
}

/// Knowledge base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the knowledge document (JSON).
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("conocimiento.json")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

/// Which retrieval strategy feeds context into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Deterministic substring/tag matching over the raw document.
    Keyword,
    /// Embedding-based nearest-neighbor matching over flattened units.
    Semantic,
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_strategy")]
    pub strategy: RetrievalStrategy,
    /// Maximum number of distinct texts a semantic search may return.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity a semantic match must strictly exceed.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Provider used for embedding calls (may differ from the chat provider).
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_strategy() -> RetrievalStrategy {
    RetrievalStrategy::Keyword
}
fn default_top_k() -> usize {
    3
}
fn default_threshold() -> f32 {
    0.4
}
fn default_embedding_provider() -> String {
    "openai".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            top_k: default_top_k(),
            threshold: default_threshold(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TecnobotConfig::default();
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.default_temperature, 0.5);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.retrieval.strategy, RetrievalStrategy::Keyword);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.threshold, 0.4);
        assert_eq!(config.knowledge.path, PathBuf::from("conocimiento.json"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            default_provider = "ollama"

            [retrieval]
            strategy = "semantic"
            threshold = 0.6
        "#;
        let config: TecnobotConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.retrieval.strategy, RetrievalStrategy::Semantic);
        assert_eq!(config.retrieval.threshold, 0.6);
        // untouched sections keep defaults
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.default_model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let err = TecnobotConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, crate::error::TecnobotError::Config(_)));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = TecnobotConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: TecnobotConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.retrieval.embedding_model, config.retrieval.embedding_model);
        assert_eq!(back.knowledge.path, config.knowledge.path);
    }
}
