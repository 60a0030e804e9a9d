//! Explicit dependencies of a conversation session.

use aura_core::ai::AiClient;
use aura_core::config::SessionSettings;
use aura_core::identity::AuthUser;
use aura_core::session::{ConversationRef, MessageStore, SavedChatRepository};
use aura_core::user::ProfileRepository;
use std::sync::Arc;

/// Everything a session talks to, injected by the caller.
///
/// There is no ambient "current user" or "current store"; each session owns
/// the handles it was opened with.
#[derive(Clone)]
pub struct SessionContext {
    pub user: AuthUser,
    pub profiles: Arc<dyn ProfileRepository>,
    pub messages: Arc<dyn MessageStore>,
    pub saved_chats: Arc<dyn SavedChatRepository>,
    pub ai: Arc<dyn AiClient>,
    pub settings: SessionSettings,
}

impl SessionContext {
    pub fn owner_id(&self) -> &str {
        &self.user.uid
    }
}

/// Which message log a session reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationScope {
    /// The user's single active log (`users/{uid}/messages`).
    #[default]
    ActiveLog,
    /// A thread under `users/{uid}/chats`. `None` allocates a new thread on
    /// the first send.
    Thread(Option<String>),
}

impl ConversationScope {
    pub fn new_thread() -> Self {
        ConversationScope::Thread(None)
    }

    /// The store reference, if the log already exists.
    pub(crate) fn resolve(&self, owner_id: &str) -> Option<ConversationRef> {
        match self {
            ConversationScope::ActiveLog => Some(ConversationRef::active_log(owner_id)),
            ConversationScope::Thread(Some(id)) => Some(ConversationRef::thread(owner_id, id)),
            ConversationScope::Thread(None) => None,
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(self, ConversationScope::Thread(_))
    }
}
