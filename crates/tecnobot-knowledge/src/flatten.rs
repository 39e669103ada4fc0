//! Flattening of the nested knowledge document into searchable units.

use crate::document::KnowledgeDocument;
use crate::render;

/// Where a search unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOrigin {
    Topic,
    Subject,
}

/// An immutable, flattened text snippet derived from one knowledge record.
///
/// Built once per loaded document; ordering is insertion order. The embedding
/// index is index-aligned with the unit sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchUnit {
    /// Unique id derived from the topic key or `"{year}-{subject}"`.
    pub id: String,
    pub origin: UnitOrigin,
    /// Human-readable rendering of the source record.
    pub text: String,
}

/// Convert a knowledge document into a uniform list of search units.
///
/// Deterministic and idempotent: re-running on an unchanged document yields
/// byte-identical output, which the embedding cache keys on. Units whose
/// rendered text is empty are dropped.
pub fn flatten(doc: &KnowledgeDocument) -> Vec<SearchUnit> {
    let mut units = Vec::new();

    for topic in doc.topics() {
        let text = render::topic_text(topic);
        if text.trim().is_empty() {
            continue;
        }
        units.push(SearchUnit {
            id: topic.key.clone(),
            origin: UnitOrigin::Topic,
            text,
        });
    }

    for subject in doc.subjects() {
        let text = render::subject_block(subject);
        if text.trim().is_empty() {
            continue;
        }
        units.push(SearchUnit {
            id: subject.id.clone(),
            origin: UnitOrigin::Subject,
            text,
        });
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::KnowledgeDocument;

    const SAMPLE: &str = r#"{
        "horarios": {
            "content": "Las clases son de 8 a 13hs.",
            "keywords": ["horario"]
        },
        "vacio": {"keywords": ["nada"]},
        "material_academico": {
            "2024": {
                "matematica": {
                    "content": "Matemática I",
                    "profesor": "Juan Pérez"
                }
            },
            "2025": {
                "matematica": {"content": "Matemática II"}
            }
        }
    }"#;

    #[test]
    fn test_one_unit_per_record_empty_dropped() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        let units = flatten(&doc);
        // "vacio" has no content and is dropped
        let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["horarios", "2024-matematica", "2025-matematica"]);
    }

    #[test]
    fn test_subject_units_use_rich_rendering() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        let units = flatten(&doc);
        let mat = units.iter().find(|u| u.id == "2024-matematica").unwrap();
        assert_eq!(mat.origin, UnitOrigin::Subject);
        assert!(mat.text.contains("**Matemática I**"));
        assert!(mat.text.contains("Profesor: Juan Pérez"));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        let first: Vec<String> = flatten(&doc).into_iter().map(|u| u.text).collect();
        let second: Vec<String> = flatten(&doc).into_iter().map(|u| u.text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_document_flattens_to_nothing() {
        let doc = KnowledgeDocument::from_json("{}").unwrap();
        assert!(flatten(&doc).is_empty());
    }
}
