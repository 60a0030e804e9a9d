//! In-process document store.
//!
//! Mirrors the document layout of the hosted backend:
//!
//! ```text
//! users/{uid}                         profile document
//! users/{uid}/messages                active message log
//! users/{uid}/chats/{chatId}          thread container
//! users/{uid}/chats/{chatId}/messages thread message log
//! users/{uid}/savedChats              archived snapshots
//! ```
//!
//! Writes are applied under a single lock, so every live query observes a
//! consistent snapshot and batch deletes are atomic.

use aura_core::session::{
    ConversationRef, ConversationSummary, Message, MessageStore, MessageSubscription, NewMessage,
    SavedChat, SavedChatRepository, sort_messages,
};
use aura_core::user::{ProfileRepository, UserProfile};
use aura_core::{AuraError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use uuid::Uuid;

struct MessageLog {
    messages: Vec<Message>,
    feed: watch::Sender<Vec<Message>>,
}

impl MessageLog {
    fn new() -> Self {
        let (feed, _) = watch::channel(Vec::new());
        Self {
            messages: Vec::new(),
            feed,
        }
    }

    fn publish(&self) {
        self.feed.send_replace(self.messages.clone());
    }
}

#[derive(Default)]
struct StoreState {
    next_seq: u64,
    profiles: HashMap<String, UserProfile>,
    logs: HashMap<ConversationRef, MessageLog>,
    conversations: HashMap<String, Vec<ConversationSummary>>,
    saved_chats: HashMap<String, Vec<(String, SavedChat)>>,
}

impl StoreState {
    fn log_mut(&mut self, conversation: &ConversationRef) -> &mut MessageLog {
        self.logs
            .entry(conversation.clone())
            .or_insert_with(MessageLog::new)
    }

    fn thread_exists(&self, conversation: &ConversationRef) -> bool {
        match &conversation.conversation_id {
            None => true,
            Some(id) => self
                .conversations
                .get(&conversation.owner_id)
                .is_some_and(|threads| threads.iter().any(|t| &t.id == id)),
        }
    }
}

/// Document store held entirely in memory.
///
/// [`MemoryDocumentStore::set_available`] simulates a backend outage: while
/// unavailable every operation fails with `StoreUnavailable` and nothing is
/// written.
pub struct MemoryDocumentStore {
    state: Mutex<StoreState>,
    available: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::info!(
            "[MemoryDocumentStore] Backend {}",
            if available { "online" } else { "offline" }
        );
    }

    /// Number of live subscriptions on a message log.
    pub fn listener_count(&self, conversation: &ConversationRef) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.logs.get(conversation).map(|log| log.feed.receiver_count()))
            .unwrap_or(0)
    }

    /// Committed messages of a log, in display order.
    pub fn messages(&self, conversation: &ConversationRef) -> Result<Vec<Message>> {
        let state = self.lock()?;
        Ok(state
            .logs
            .get(conversation)
            .map(|log| log.messages.clone())
            .unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(AuraError::store_unavailable("document store is offline"));
        }
        self.state
            .lock()
            .map_err(|_| AuraError::internal("document store lock poisoned"))
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryDocumentStore {
    async fn append(&self, conversation: &ConversationRef, message: NewMessage) -> Result<String> {
        let mut state = self.lock()?;
        if !state.thread_exists(conversation) {
            return Err(AuraError::not_found("conversation", conversation.to_string()));
        }

        state.next_seq += 1;
        let stored = Message {
            id: Uuid::new_v4().to_string(),
            text: message.text,
            sender: message.sender,
            created_at: message.created_at.unwrap_or_else(Utc::now),
            seq: state.next_seq,
            client_id: Some(message.client_id),
        };
        let id = stored.id.clone();

        let log = state.log_mut(conversation);
        log.messages.push(stored);
        sort_messages(&mut log.messages);
        log.publish();

        tracing::debug!(
            "[MemoryDocumentStore] Appended {} to {} ({} messages)",
            id,
            conversation,
            log.messages.len()
        );
        Ok(id)
    }

    async fn subscribe(&self, conversation: &ConversationRef) -> Result<MessageSubscription> {
        let mut state = self.lock()?;
        let log = state.log_mut(conversation);
        let subscription = MessageSubscription::new(log.feed.subscribe());
        tracing::debug!(
            "[MemoryDocumentStore] Listener attached to {} ({} active)",
            conversation,
            log.feed.receiver_count()
        );
        Ok(subscription)
    }

    async fn clear_all(&self, conversation: &ConversationRef) -> Result<usize> {
        let mut state = self.lock()?;
        let log = state.log_mut(conversation);
        let removed = log.messages.len();
        log.messages.clear();
        log.publish();

        tracing::info!(
            "[MemoryDocumentStore] Cleared {} messages from {}",
            removed,
            conversation
        );
        Ok(removed)
    }

    async fn create_conversation(&self, owner_id: &str, title: &str) -> Result<String> {
        let mut state = self.lock()?;
        let summary = ConversationSummary {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        let id = summary.id.clone();
        state
            .conversations
            .entry(owner_id.to_string())
            .or_default()
            .push(summary);

        tracing::info!("[MemoryDocumentStore] Created conversation {} for {}", id, owner_id);
        Ok(id)
    }

    async fn list_conversations(&self, owner_id: &str) -> Result<Vec<ConversationSummary>> {
        let state = self.lock()?;
        let mut threads = state
            .conversations
            .get(owner_id)
            .cloned()
            .unwrap_or_default();
        // Insertion order is creation order.
        threads.reverse();
        Ok(threads)
    }
}

#[async_trait]
impl SavedChatRepository for MemoryDocumentStore {
    async fn save_chat(&self, owner_id: &str, chat: &SavedChat) -> Result<String> {
        let mut state = self.lock()?;
        let id = Uuid::new_v4().to_string();
        state
            .saved_chats
            .entry(owner_id.to_string())
            .or_default()
            .push((id.clone(), chat.clone()));

        tracing::info!(
            "[MemoryDocumentStore] Saved chat '{}' ({} messages) for {}",
            chat.title,
            chat.messages.len(),
            owner_id
        );
        Ok(id)
    }

    async fn list_chats(&self, owner_id: &str) -> Result<Vec<SavedChat>> {
        let state = self.lock()?;
        Ok(state
            .saved_chats
            .get(owner_id)
            .map(|chats| chats.iter().map(|(_, chat)| chat.clone()).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProfileRepository for MemoryDocumentStore {
    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let state = self.lock()?;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        let mut state = self.lock()?;
        state.profiles.insert(user_id.to_string(), profile.clone());
        tracing::debug!("[MemoryDocumentStore] Saved profile for {}", user_id);
        Ok(())
    }
}
