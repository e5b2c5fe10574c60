//! Chat domain types.
//!
//! A conversation is an ordered, append-only sequence of role-tagged
//! messages. Mutation goes through [`crate::services::ConversationStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to conversations created without an explicit one.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Maximum number of characters kept when a title is derived from a message.
pub const TITLE_MAX_CHARS: usize = 50;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Parse a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One role-tagged utterance. Also the wire shape of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// A chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Messages in chronological order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, bump `updated_at` and derive the title from the
    /// first message.
    pub(crate) fn append(&mut self, message: ChatMessage) {
        if self.messages.is_empty() {
            self.title = title_from_content(&message.content);
        }
        self.messages.push(message);
        // Never move backwards, even if the wall clock does.
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Derive a conversation title from message content.
///
/// Content longer than [`TITLE_MAX_CHARS`] characters is cut and suffixed
/// with `...`; shorter content is used verbatim.
pub fn title_from_content(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let head: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}
