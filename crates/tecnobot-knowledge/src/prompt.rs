//! Prompt assembly: the closed-book instruction template and the bounded
//! conversation window sent to the model.

use tecnobot_core::types::{Message, Role};

/// Closed-book policy: the model answers only from the supplied context and
/// must emit the fixed refusal sentence otherwise.
pub const SYSTEM_PROMPT: &str = "\
Eres un asistente virtual experto del \"Instituto 13 de Julio\" llamado \"TecnoBot\".
Tu única función es responder preguntas sobre el instituto, basándote EXCLUSIVAMENTE en la información proporcionada en el CONTEXTO RELEVANTE.
NO PUEDES usar conocimiento externo o buscar en la web. Tu única fuente de verdad es el contexto.
Si la pregunta del usuario no se puede responder con el contexto, DEBES decir amablemente: \"No tengo información sobre ese tema. Mi conocimiento se limita a los datos del instituto. Te sugiero reformular tu pregunta o contactar a secretaría.\"
No inventes nada. Sé amable, servicial y preséntate como \"TecnoBot\" en tu primer saludo.";

/// Most recent non-system turns kept in the upstream request.
pub const HISTORY_WINDOW: usize = 10;

/// Embed the retrieval result into the instruction template. The rendered
/// prompt always contains exactly one retrieval block.
pub fn assemble(context: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nCONTEXTO RELEVANTE:\n{context}")
}

/// Build the message list for one completion call: the assembled system
/// prompt followed by the conversation history truncated to the most recent
/// [`HISTORY_WINDOW`] non-system turns.
pub fn build_request(system_prompt: &str, history: &[Message]) -> Vec<Message> {
    let recent: Vec<&Message> = history.iter().filter(|m| m.role != Role::System).collect();
    let start = recent.len().saturating_sub(HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(recent.len() - start + 1);
    messages.push(Message::system(system_prompt));
    messages.extend(recent[start..].iter().map(|m| (*m).clone()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_contains_one_context_block() {
        let prompt = assemble("- Las clases son de 8 a 13hs.\n");
        assert_eq!(prompt.matches("CONTEXTO RELEVANTE:").count(), 1);
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("- Las clases son de 8 a 13hs.\n"));
    }

    #[test]
    fn test_request_leads_with_system_message() {
        let history = vec![Message::assistant("hola"), Message::user("¿horarios?")];
        let request = build_request(&assemble("ctx"), &history);
        assert_eq!(request[0].role, Role::System);
        assert_eq!(request.len(), 3);
        assert_eq!(request[2].content, "¿horarios?");
    }

    #[test]
    fn test_history_truncated_to_window() {
        let mut history = Vec::new();
        for i in 0..15 {
            history.push(Message::user(format!("pregunta {i}")));
        }
        let request = build_request("sys", &history);
        // system + last 10 turns
        assert_eq!(request.len(), 1 + HISTORY_WINDOW);
        assert_eq!(request[1].content, "pregunta 5");
        assert_eq!(request.last().unwrap().content, "pregunta 14");
    }

    #[test]
    fn test_prior_system_messages_are_excluded() {
        let history = vec![
            Message::system("vieja instrucción"),
            Message::user("hola"),
        ];
        let request = build_request("sys", &history);
        assert_eq!(request.len(), 2);
        assert!(request.iter().all(|m| m.content != "vieja instrucción"));
    }
}
