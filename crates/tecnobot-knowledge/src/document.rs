//! Knowledge document model and loader.
//!
//! The on-disk format is a UTF-8 JSON object mapping topic keys to records,
//! with two reserved keys: `material_academico` nests subject records by
//! year, and `info_general` is the keyword retriever's fallback topic.
//! Entry order in the file drives result concatenation order, so parsing
//! relies on serde_json's `preserve_order` feature.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use tecnobot_core::error::{Result, TecnobotError};

/// Reserved key for the nested subjects-by-year section.
pub const ACADEMIC_SECTION_KEY: &str = "material_academico";

/// Reserved key for the keyword retriever's fallback topic.
pub const GENERAL_INFO_KEY: &str = "info_general";

/// A flat knowledge topic.
///
/// `keywords` entries are lowercase substrings matched against a lowercased
/// user query. An empty set means the topic never matches and is only
/// reachable as the fallback.
#[derive(Debug, Clone)]
pub struct Topic {
    pub key: String,
    pub content: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TopicRecord {
    #[serde(default)]
    content: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// One scheduled evaluation of a subject.
#[derive(Debug, Clone, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "temas")]
    pub topics: String,
}

/// A named link to topic notes.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicNote {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apuntes")]
    pub link: String,
}

/// The record stored for one subject inside the academic section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectRecord {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(rename = "profesor")]
    pub instructor: Option<String>,
    #[serde(rename = "evaluaciones", default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(rename = "temas", default)]
    pub notes: Vec<TopicNote>,
}

/// A subject from the academic section, with its composite identity.
///
/// The id is `"{year}-{subject}"`, unique even across years that share a
/// subject name.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    pub year: String,
    pub name: String,
    pub record: SubjectRecord,
}

/// A knowledge entry, tagged at load time so retrieval code never
/// special-cases reserved keys.
#[derive(Debug, Clone)]
pub enum KnowledgeEntry {
    Topic(Topic),
    Subject(Subject),
}

/// The loaded knowledge base. Read-only for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeDocument {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeDocument {
    /// Load and parse the knowledge document at `path`.
    ///
    /// Fails with [`TecnobotError::KnowledgeNotFound`] when the path does not
    /// resolve to a readable file and [`TecnobotError::MalformedDocument`]
    /// when the content does not parse. No retries — the caller decides
    /// whether to halt or degrade.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TecnobotError::KnowledgeNotFound(path.to_path_buf())
            } else {
                TecnobotError::Io(e)
            }
        })?;
        let doc = Self::from_json(&content)?;
        tracing::info!(
            "📚 Knowledge base loaded: {} topics, {} subjects ({})",
            doc.topics().count(),
            doc.subjects().count(),
            path.display()
        );
        Ok(doc)
    }

    /// Parse a knowledge document from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| TecnobotError::MalformedDocument(e.to_string()))?;
        let Value::Object(map) = root else {
            return Err(TecnobotError::MalformedDocument(
                "top level must be an object".into(),
            ));
        };

        let mut entries = Vec::new();
        for (key, value) in map {
            if key == ACADEMIC_SECTION_KEY {
                parse_academic_section(&value, &mut entries)?;
            } else {
                let record: TopicRecord = serde_json::from_value(value).map_err(|e| {
                    TecnobotError::MalformedDocument(format!("topic '{key}': {e}"))
                })?;
                entries.push(KnowledgeEntry::Topic(Topic {
                    key,
                    content: record.content,
                    keywords: record.keywords,
                }));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Flat topics, in document order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.entries.iter().filter_map(|e| match e {
            KnowledgeEntry::Topic(t) => Some(t),
            KnowledgeEntry::Subject(_) => None,
        })
    }

    /// Academic subjects, in document order (year-major).
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.entries.iter().filter_map(|e| match e {
            KnowledgeEntry::Subject(s) => Some(s),
            KnowledgeEntry::Topic(_) => None,
        })
    }

    /// The fallback topic, if present.
    pub fn general_info(&self) -> Option<&Topic> {
        self.topics().find(|t| t.key == GENERAL_INFO_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_academic_section(value: &Value, entries: &mut Vec<KnowledgeEntry>) -> Result<()> {
    let Some(years) = value.as_object() else {
        return Err(TecnobotError::MalformedDocument(format!(
            "'{ACADEMIC_SECTION_KEY}' must map year labels to subjects"
        )));
    };

    for (year, subjects) in years {
        let Some(subjects) = subjects.as_object() else {
            return Err(TecnobotError::MalformedDocument(format!(
                "year '{year}' must map subject names to records"
            )));
        };
        for (name, record) in subjects {
            let record: SubjectRecord =
                serde_json::from_value(record.clone()).map_err(|e| {
                    TecnobotError::MalformedDocument(format!("subject '{year}/{name}': {e}"))
                })?;
            entries.push(KnowledgeEntry::Subject(Subject {
                id: format!("{year}-{name}"),
                year: year.clone(),
                name: name.clone(),
                record,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "horarios": {
            "content": "Las clases son de 8 a 13hs.",
            "keywords": ["horario", "horarios"]
        },
        "info_general": {
            "content": "El Instituto 13 de Julio ofrece carreras técnicas."
        },
        "material_academico": {
            "2024": {
                "matematica": {
                    "content": "Matemática I",
                    "keywords": ["matematica"],
                    "profesor": "Juan Pérez",
                    "evaluaciones": [{"fecha": "10/06", "temas": "Álgebra"}],
                    "temas": [{"nombre": "Guía 1", "apuntes": "https://example.com/g1"}]
                }
            },
            "2025": {
                "matematica": {
                    "content": "Matemática II",
                    "keywords": ["matematica ii"]
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_topics_and_subjects() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        assert_eq!(doc.topics().count(), 2);
        assert_eq!(doc.subjects().count(), 2);

        let horarios = doc.topics().next().unwrap();
        assert_eq!(horarios.key, "horarios");
        assert_eq!(horarios.keywords, vec!["horario", "horarios"]);

        let mat = doc.subjects().next().unwrap();
        assert_eq!(mat.id, "2024-matematica");
        assert_eq!(mat.record.instructor.as_deref(), Some("Juan Pérez"));
        assert_eq!(mat.record.evaluations[0].date, "10/06");
        assert_eq!(mat.record.notes[0].name, "Guía 1");
    }

    #[test]
    fn test_composite_ids_unique_across_years() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        let ids: Vec<&str> = doc.subjects().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2024-matematica", "2025-matematica"]);
    }

    #[test]
    fn test_general_info_lookup() {
        let doc = KnowledgeDocument::from_json(SAMPLE).unwrap();
        let info = doc.general_info().unwrap();
        assert!(info.content.contains("Instituto 13 de Julio"));
        // no keywords: reachable only as fallback
        assert!(info.keywords.is_empty());
    }

    #[test]
    fn test_document_order_preserved() {
        let doc = KnowledgeDocument::from_json(
            r#"{"b": {"content": "B"}, "a": {"content": "A"}, "c": {"content": "C"}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = doc.topics().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = KnowledgeDocument::load(Path::new("/no/such/conocimiento.json")).unwrap_err();
        assert!(matches!(err, TecnobotError::KnowledgeNotFound(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let err = KnowledgeDocument::load(file.path()).unwrap_err();
        assert!(matches!(err, TecnobotError::MalformedDocument(_)));
    }

    #[test]
    fn test_non_object_root_is_malformed() {
        let err = KnowledgeDocument::from_json(r#"["a", "b"]"#).unwrap_err();
        assert!(matches!(err, TecnobotError::MalformedDocument(_)));
    }

    #[test]
    fn test_non_object_academic_section_is_malformed() {
        let err =
            KnowledgeDocument::from_json(r#"{"material_academico": "oops"}"#).unwrap_err();
        assert!(matches!(err, TecnobotError::MalformedDocument(_)));
    }

    #[test]
    fn test_topic_defaults_for_missing_fields() {
        let doc = KnowledgeDocument::from_json(r#"{"vacio": {}}"#).unwrap();
        let topic = doc.topics().next().unwrap();
        assert_eq!(topic.content, "");
        assert!(topic.keywords.is_empty());
    }
}
