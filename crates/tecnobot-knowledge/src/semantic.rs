//! Embedding-based semantic retrieval over flattened search units.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use tecnobot_core::error::{Result, TecnobotError};
use tecnobot_core::traits::{Embedder, RetrievalResult, Retriever};

use crate::flatten::SearchUnit;

/// Returned when no unit clears the similarity threshold. Deliberately NOT
/// the keyword retriever's general-info fallback: the two strategies have
/// different, documented empty-result behaviors.
pub const NO_INFORMATION_FALLBACK: &str = "No se encontró información relevante.";

/// One embedding vector per search unit, index-aligned with the unit
/// sequence. Built once, read-only; rebuilt only when the knowledge document
/// changes.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Embed every unit's text. Fails with
    /// [`TecnobotError::EmbeddingUnavailable`] when the provider fails or
    /// returns a misaligned batch.
    pub async fn build(embedder: &dyn Embedder, units: &[SearchUnit]) -> Result<Self> {
        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != units.len() {
            return Err(TecnobotError::EmbeddingUnavailable(format!(
                "provider returned {} vectors for {} units",
                vectors.len(),
                units.len()
            )));
        }
        tracing::debug!("Embedding index built: {} vectors", vectors.len());
        Ok(Self { vectors })
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Cosine similarity between two vectors, in [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Nearest-neighbor matcher over the flattened units.
///
/// Ranks all units by descending cosine similarity to the query embedding
/// and accepts at most `top_k` distinct texts whose similarity strictly
/// exceeds `threshold`. Retrieval is a function of the similarity ranking,
/// not of query phrasing.
pub struct SemanticRetriever {
    units: Arc<Vec<SearchUnit>>,
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    threshold: f32,
}

impl SemanticRetriever {
    pub fn new(
        units: Arc<Vec<SearchUnit>>,
        index: Arc<EmbeddingIndex>,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
        threshold: f32,
    ) -> Self {
        debug_assert_eq!(units.len(), index.len(), "index must align with units");
        Self {
            units,
            index,
            embedder,
            top_k,
            threshold,
        }
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    fn name(&self) -> &str {
        "semantic"
    }

    async fn search(&self, query: &str) -> Result<RetrievalResult> {
        let query_vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = query_vectors.first().ok_or_else(|| {
            TecnobotError::EmbeddingUnavailable("empty embedding response for query".into())
        })?;

        let mut ranked: Vec<(usize, f32)> = self
            .index
            .vectors()
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query_vector, v)))
            .collect();
        // stable sort: ties keep original unit order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut seen: HashSet<&str> = HashSet::new();
        let mut accepted: Vec<&str> = Vec::new();
        for (i, score) in ranked {
            if accepted.len() >= self.top_k {
                break;
            }
            if score <= self.threshold {
                // descending order: nothing further can clear the threshold
                break;
            }
            let text = self.units[i].text.as_str();
            // dedup by exact text, not id
            if seen.insert(text) {
                accepted.push(text);
            }
        }

        if accepted.is_empty() {
            return Ok(RetrievalResult {
                context: NO_INFORMATION_FALLBACK.to_string(),
                matched: false,
            });
        }

        Ok(RetrievalResult {
            context: accepted.join("\n\n"),
            matched: true,
        })
    }
}
