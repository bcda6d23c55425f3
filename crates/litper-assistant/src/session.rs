use serde::{Deserialize, Serialize};

/// A single message in the chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Chat history capped at `max_messages`; the oldest messages drop first.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    max_messages: usize,
}

impl ChatSession {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.push(Role::Assistant, content);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// History rendered for inclusion in an LLM prompt.
    pub fn format_for_prompt(&self) -> String {
        if self.messages.is_empty() {
            return String::new();
        }

        let mut out = String::from("Historial de la conversación:\n");
        for msg in &self.messages {
            let prefix = match msg.role {
                Role::User => "Usuario",
                Role::Assistant => "Asistente",
            };
            out.push_str(&format!("{prefix}: {}\n", msg.content));
        }
        out
    }

    fn push(&mut self, role: Role, content: &str) {
        self.messages.push(Message {
            role,
            content: content.to_string(),
        });
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_push_and_trim() {
        let mut session = ChatSession::new(3);
        session.push_user("hola");
        session.push_assistant("¡Hola!");
        session.push_user("¿tasa de entrega?");
        session.push_assistant("40%");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        assert_eq!(session.messages()[0].content, "¡Hola!");
    }

    #[test]
    fn test_format_for_prompt() {
        let mut session = ChatSession::new(20);
        assert_eq!(session.format_for_prompt(), "");
        session.push_user("¿cuántos críticos?");
        session.push_assistant("Hay 1 envío crítico.");
        let formatted = session.format_for_prompt();
        assert!(formatted.contains("Usuario: ¿cuántos críticos?"));
        assert!(formatted.contains("Asistente: Hay 1 envío crítico."));
    }
}
