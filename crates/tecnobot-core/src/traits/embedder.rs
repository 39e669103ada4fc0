//! Text embedding provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// Embeds text into numeric vectors for similarity comparison.
///
/// Implementations must return one vector per input text, index-aligned with
/// the input slice, all in the same vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedder name (provider identifier).
    fn name(&self) -> &str;

    /// Embed a batch of texts. Failures surface as
    /// [`TecnobotError::EmbeddingUnavailable`](crate::TecnobotError::EmbeddingUnavailable),
    /// never as silently stale vectors.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
