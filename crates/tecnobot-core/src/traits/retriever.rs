//! Retrieval strategy trait.
//!
//! The keyword and semantic retrievers are genuinely different algorithms
//! with different fallback policies, selected by configuration. They share
//! this contract, not their fallback behavior.

use async_trait::async_trait;

use crate::error::Result;

/// Context selected for one query. Created fresh per query and discarded
/// after being embedded into the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Concatenated context block to inject into the prompt.
    pub context: String,
    /// False when the context is fallback text rather than a match.
    pub matched: bool,
}

/// A retrieval strategy over the loaded knowledge base.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Strategy name (e.g., "keyword", "semantic").
    fn name(&self) -> &str;

    /// Select context for a user query.
    async fn search(&self, query: &str) -> Result<RetrievalResult>;
}
