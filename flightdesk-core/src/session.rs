// flightdesk-core/src/session.rs
use crate::models::chat::{ChatMessage, Role};
use serde::Serialize;
use uuid::Uuid;

/// The visible transcript of one chat session: user and assistant turns in
/// order. It only grows, and lives in memory until the session ends.
#[derive(Serialize, Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(ChatMessage::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_appends_in_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());
        conversation.push_user("Flights from JFK to LAX today");
        conversation.push_assistant("Here are today's flights.");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
        assert_eq!(conversation.last_assistant_text(), Some("Here are today's flights."));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(Conversation::new().id(), Conversation::new().id());
    }
}
