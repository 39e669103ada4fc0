//! Initialization-once retrieval context.
//!
//! One `KnowledgeEngine` is constructed at process start and passed by
//! handle into every retrieval call — no ambient global cache state. The
//! document and flattened units are read-only after construction; the
//! embedding index is built lazily and memoized on the content of the
//! flattened corpus, so repeated initialization never recomputes embeddings.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use tecnobot_core::error::Result;
use tecnobot_core::traits::Embedder;

use crate::document::KnowledgeDocument;
use crate::flatten::{SearchUnit, flatten};
use crate::keyword::KeywordRetriever;
use crate::semantic::{EmbeddingIndex, SemanticRetriever};

pub struct KnowledgeEngine {
    document: Arc<KnowledgeDocument>,
    units: Arc<Vec<SearchUnit>>,
    corpus_hash: u64,
    index: Mutex<Option<(u64, Arc<EmbeddingIndex>)>>,
}

impl KnowledgeEngine {
    /// Load the knowledge document at `path` and derive the searchable units.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(KnowledgeDocument::load(path)?))
    }

    pub fn new(document: KnowledgeDocument) -> Self {
        let units = flatten(&document);
        let corpus_hash = corpus_hash(&units);
        tracing::debug!("Flattened {} search units (corpus hash {corpus_hash:016x})", units.len());
        Self {
            document: Arc::new(document),
            units: Arc::new(units),
            corpus_hash,
            index: Mutex::new(None),
        }
    }

    pub fn document(&self) -> Arc<KnowledgeDocument> {
        self.document.clone()
    }

    pub fn units(&self) -> Arc<Vec<SearchUnit>> {
        self.units.clone()
    }

    pub fn keyword_retriever(&self) -> KeywordRetriever {
        KeywordRetriever::new(self.document.clone())
    }

    /// Build a semantic retriever, constructing the embedding index on first
    /// use. Index-build failure is fatal to the retrieval subsystem and is
    /// surfaced to the caller.
    pub async fn semantic_retriever(
        &self,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
        threshold: f32,
    ) -> Result<SemanticRetriever> {
        let index = self.ensure_index(embedder.as_ref()).await?;
        Ok(SemanticRetriever::new(
            self.units.clone(),
            index,
            embedder,
            top_k,
            threshold,
        ))
    }

    /// Return the embedding index, building it at most once per corpus.
    pub async fn ensure_index(&self, embedder: &dyn Embedder) -> Result<Arc<EmbeddingIndex>> {
        let mut guard = self.index.lock().await;
        if let Some((hash, index)) = guard.as_ref() {
            if *hash == self.corpus_hash {
                return Ok(index.clone());
            }
        }

        tracing::info!(
            "🧠 Building embedding index: {} units via '{}'",
            self.units.len(),
            embedder.name()
        );
        let index = Arc::new(EmbeddingIndex::build(embedder, &self.units).await?);
        *guard = Some((self.corpus_hash, index.clone()));
        Ok(index)
    }
}

/// Content hash of the flattened corpus, used as the embedding memo key.
fn corpus_hash(units: &[SearchUnit]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for unit in units {
        unit.id.hash(&mut hasher);
        unit.text.hash(&mut hasher);
    }
    hasher.finish()
}
