//! Append-only conversation log.

use geoguide_core::types::Message;

/// Ordered transcript of one session. Insertion order is never changed and
/// entries are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        tracing::trace!(id = %message.id, role = %message.role, "Message appended");
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Everything except the most recent message.
    pub fn history_before_last(&self) -> &[Message] {
        let end = self.messages.len().saturating_sub(1);
        &self.messages[..end]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
