//! # TecnoBot Knowledge Base
//!
//! The RAG retrieval core: loads a structured JSON knowledge document,
//! flattens it into searchable units, and selects context for each user
//! turn via one of two strategies.
//!
//! ## How it works
//! ```text
//! conocimiento.json
//!   ↓ load (once per process)
//! KnowledgeDocument — flat topics + nested academic material
//!   ↓ flatten
//! SearchUnits — one text snippet per topic/subject
//!   ↓ keyword substring match        ↓ embed once, cosine-rank per query
//! KeywordRetriever                   SemanticRetriever
//!   ↓
//! RetrievalResult → injected into the system prompt as CONTEXTO RELEVANTE
//! ```
//!
//! The two retrievers deliberately differ in their empty-result behavior:
//! keyword search falls back to the `info_general` topic, semantic search
//! returns its own no-information message and never consults a default topic.

pub mod document;
pub mod engine;
pub mod flatten;
pub mod keyword;
pub mod prompt;
pub mod render;
pub mod semantic;

pub use document::{KnowledgeDocument, KnowledgeEntry, Subject, Topic};
pub use engine::KnowledgeEngine;
pub use flatten::{SearchUnit, flatten};
pub use keyword::KeywordRetriever;
pub use semantic::{EmbeddingIndex, SemanticRetriever};
