use crate::models::chat::{ Message, MessageKind, Role };
use chrono::Utc;
use uuid::Uuid;

/// Ordered, append-only log of the current conversation. Lives for the
/// process only; a restart starts from an empty log.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message with a fresh id and the current timestamp, and
    /// returns a reference to it. Insertion order is the display order.
    pub fn add_message(&mut self, content: String, kind: MessageKind, role: Role) -> &Message {
        let index = self.messages.len();
        self.messages.push(Message {
            id: Uuid::new_v4(),
            content,
            kind,
            role,
            created_at: Utc::now(),
        });
        &self.messages[index]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
