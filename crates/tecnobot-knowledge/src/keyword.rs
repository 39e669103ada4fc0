//! Deterministic keyword retrieval over the raw knowledge document.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use tecnobot_core::error::Result;
use tecnobot_core::traits::{RetrievalResult, Retriever};

use crate::document::KnowledgeDocument;
use crate::render;

/// Returned when nothing matched and no `info_general` topic exists.
pub const NO_CONTEXT_FALLBACK: &str = "No se encontró contexto específico.";

/// Substring/tag matcher over topics and subjects.
///
/// A record matches when any of its keywords is a substring of the lowercased
/// query. Matches are concatenated in document order, each topic as a bullet
/// line and each subject as its rich block; there is no ranking and no
/// relevance threshold.
pub struct KeywordRetriever {
    document: Arc<KnowledgeDocument>,
}

impl KeywordRetriever {
    pub fn new(document: Arc<KnowledgeDocument>) -> Self {
        Self { document }
    }

    /// Synchronous search core. The trait wrapper is async only to share the
    /// `Retriever` contract with the semantic strategy.
    pub fn search_sync(&self, query: &str) -> RetrievalResult {
        let query = query.to_lowercase();
        // each topic/subject contributes at most once, even when several of
        // its keywords match
        let mut consumed: HashSet<&str> = HashSet::new();
        let mut context = String::new();

        for topic in self.document.topics() {
            if consumed.contains(topic.key.as_str()) {
                continue;
            }
            if topic.keywords.iter().any(|k| query.contains(k.as_str())) {
                context.push_str(&format!("- {}\n", topic.content));
                consumed.insert(topic.key.as_str());
            }
        }

        for subject in self.document.subjects() {
            if consumed.contains(subject.id.as_str()) {
                continue;
            }
            if subject
                .record
                .keywords
                .iter()
                .any(|k| query.contains(k.as_str()))
            {
                context.push('\n');
                context.push_str(&render::subject_block(subject));
                consumed.insert(subject.id.as_str());
            }
        }

        if context.is_empty() {
            let fallback = self
                .document
                .general_info()
                .map(|t| t.content.as_str())
                .filter(|c| !c.is_empty())
                .unwrap_or(NO_CONTEXT_FALLBACK);
            return RetrievalResult {
                context: fallback.to_string(),
                matched: false,
            };
        }

        RetrievalResult {
            context,
            matched: true,
        }
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn search(&self, query: &str) -> Result<RetrievalResult> {
        Ok(self.search_sync(query))
    }
}
