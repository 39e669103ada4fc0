//! Rendering of knowledge records into prompt-ready text.
//!
//! The keyword retriever and the flattener must emit byte-identical subject
//! blocks, so both go through this module.

use crate::document::{Subject, Topic};

/// Human-readable label derived from a topic or subject key:
/// `"info_general"` → `"Info General"`.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flattened text for a topic: labelled content, or empty when the topic has
/// no content (empty texts are dropped downstream).
pub fn topic_text(topic: &Topic) -> String {
    if topic.content.trim().is_empty() {
        String::new()
    } else {
        format!("{}: {}", humanize_key(&topic.key), topic.content)
    }
}

/// The rich rendering of a subject: title, instructor, and — when present —
/// one line per evaluation and per topic note.
pub fn subject_block(subject: &Subject) -> String {
    let record = &subject.record;
    let title = if record.content.trim().is_empty() {
        humanize_key(&subject.name)
    } else {
        record.content.clone()
    };

    let mut block = format!("**{title}**\n");
    block.push_str(&format!(
        "Profesor: {}\n",
        record.instructor.as_deref().unwrap_or("No asignado")
    ));

    if !record.evaluations.is_empty() {
        block.push_str("**Próximas Evaluaciones:**\n");
        for eval in &record.evaluations {
            block.push_str(&format!("  - Fecha: {}, Temas: {}\n", eval.date, eval.topics));
        }
    }

    if !record.notes.is_empty() {
        block.push_str("**Temas y Apuntes:**\n");
        for note in &record.notes {
            block.push_str(&format!("  - [{}]({})\n", note.name, note.link));
        }
    }

    block
}
