//! Chat orchestrator - one request/response exchange over the current
//! conversation.
//!
//! The user message is appended before the remote call and is kept no
//! matter how the call ends. Every failure is returned to the caller and
//! mirrored into the controller's error slot; nothing is retried.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{ConversationStore, ServiceController};
use crate::contracts::{ChatRequest, ChatUsage};
use crate::domain::{ChatMessage, Conversation};
use crate::ports::CoreError;

/// Sampling temperature sent with every chat request.
pub const CHAT_TEMPERATURE: f32 = 0.8;
/// Nucleus sampling threshold sent with every chat request.
pub const CHAT_TOP_P: f32 = 0.9;
/// Completion token cap sent with every chat request.
pub const CHAT_MAX_TOKENS: u32 = 512;

/// Outcome of a successful [`ChatOrchestrator::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub conversation_id: Uuid,
    pub reply: ChatMessage,
    pub usage: Option<ChatUsage>,
}

/// Counts a send for as long as it is outstanding.
struct SendGuard<'a>(&'a AtomicUsize);

impl<'a> SendGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Composes the conversation store with the service controller.
pub struct ChatOrchestrator {
    controller: Arc<ServiceController>,
    /// Never held across an `.await`.
    store: RwLock<ConversationStore>,
    in_flight: AtomicUsize,
}

impl ChatOrchestrator {
    pub fn new(controller: Arc<ServiceController>) -> Self {
        Self {
            controller,
            store: RwLock::new(ConversationStore::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ConversationStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConversationStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, err: CoreError) -> CoreError {
        self.controller.record_error(err.to_string());
        err
    }

    /// Whether a message may be sent right now.
    ///
    /// False while the service is down or another send is outstanding.
    /// Concurrent sends are not otherwise prevented.
    pub fn can_send(&self) -> bool {
        self.controller.is_running() && self.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Send `content` in the current conversation (created if none) and
    /// append the reply.
    pub async fn send_message(&self, content: impl Into<String>) -> Result<ChatExchange, CoreError> {
        let status = self.controller.status();
        if !status.is_running {
            return Err(self.fail(CoreError::NotRunning));
        }

        let _sending = SendGuard::enter(&self.in_flight);

        let (conversation_id, history) = {
            let mut store = self.write();
            let id = match store.current_id() {
                Some(id) => id,
                None => store.create(None).id,
            };
            store
                .append(id, ChatMessage::user(content))
                .map_err(|e| self.fail(e))?;
            let history = store
                .get(id)
                .map(|c| c.messages().to_vec())
                .unwrap_or_default();
            (id, history)
        };

        let request = ChatRequest {
            model: status.model_name,
            messages: history,
            temperature: Some(CHAT_TEMPERATURE),
            top_p: Some(CHAT_TOP_P),
            max_tokens: Some(CHAT_MAX_TOKENS),
            stream: None,
        };
        debug!(
            conversation = %conversation_id,
            messages = request.messages.len(),
            model = %request.model,
            "Sending chat request"
        );

        let response = self
            .controller
            .chat(&request)
            .await
            .map_err(|e| self.fail(e))?;

        let Some(reply) = response.first_message().cloned() else {
            return Err(self.fail(CoreError::EmptyResponse));
        };

        if let Err(e) = self.write().append(conversation_id, reply.clone()) {
            warn!(conversation = %conversation_id, error = %e, "Conversation removed before reply arrived");
        }

        Ok(ChatExchange {
            conversation_id,
            reply,
            usage: response.usage,
        })
    }

    /// Snapshot of all conversations, newest first.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.read().list().to_vec()
    }

    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        self.read().get(id).cloned()
    }

    pub fn current_conversation(&self) -> Option<Conversation> {
        self.read().current().cloned()
    }

    pub fn new_conversation(&self, title: Option<String>) -> Conversation {
        self.write().create(title)
    }

    pub fn select_conversation(&self, id: Uuid) -> Result<(), CoreError> {
        self.write().select(id)
    }

    pub fn delete_conversation(&self, id: Uuid) -> bool {
        self.write().delete(id)
    }

    pub fn clear_conversations(&self) {
        self.write().clear_all();
    }
}
