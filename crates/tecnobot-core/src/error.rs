//! TecnoBot error taxonomy.
//!
//! Loader and index-build failures are fatal to the retrieval subsystem and
//! propagate to the caller; per-query embedding failures are expected to be
//! degraded by the caller into an explicit context-unavailable answer.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TecnobotError>;

#[derive(Error, Debug)]
pub enum TecnobotError {
    #[error("configuration error: {0}")]
    Config(String),

    /// The knowledge document path does not resolve to a readable file.
    #[error("knowledge document not found: {}", .0.display())]
    KnowledgeNotFound(PathBuf),

    /// The knowledge document does not parse into the expected nested-mapping shape.
    #[error("malformed knowledge document: {0}")]
    MalformedDocument(String),

    /// The embedding provider failed, at index-build or query time.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
