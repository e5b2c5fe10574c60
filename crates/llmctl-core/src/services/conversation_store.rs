//! Conversation store - owns the conversation collection and the current
//! selection.
//!
//! Conversations are only removed by an explicit `delete` or `clear_all`.
//! Deleting the current conversation leaves no selection behind; nothing
//! is picked automatically.

use uuid::Uuid;

use crate::domain::{ChatMessage, Conversation};
use crate::ports::CoreError;

/// In-memory collection of conversations, newest first.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<Uuid>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty conversation and make it current.
    pub fn create(&mut self, title: Option<String>) -> Conversation {
        let conversation = Conversation::new(title);
        self.current = Some(conversation.id);
        self.conversations.insert(0, conversation.clone());
        conversation
    }

    /// Make `id` the current conversation.
    ///
    /// An unknown id fails and leaves the selection unchanged.
    pub fn select(&mut self, id: Uuid) -> Result<(), CoreError> {
        if self.get(id).is_none() {
            return Err(CoreError::ConversationNotFound(id));
        }
        self.current = Some(id);
        Ok(())
    }

    /// Remove a conversation. Returns whether anything was removed.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.current == Some(id) {
            self.current = None;
        }
        self.conversations.len() != before
    }

    /// Remove every conversation and clear the selection.
    pub fn clear_all(&mut self) {
        self.conversations.clear();
        self.current = None;
    }

    /// Append a message to a conversation.
    ///
    /// Restricted to the chat orchestrator. The first message of a
    /// conversation also determines its title.
    pub(crate) fn append(&mut self, id: Uuid, message: ChatMessage) -> Result<(), CoreError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CoreError::ConversationNotFound(id))?;
        conversation.append(message);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// The current conversation, if one is selected.
    pub fn current(&self) -> Option<&Conversation> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current
    }

    /// All conversations, newest first.
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
