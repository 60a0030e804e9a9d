//! Message store contracts.
//!
//! Defines the interface to the remote document store's message collections,
//! decoupling the session engine from the backend SDK.

use super::message::{Message, NewMessage};
use super::saved_chat::SavedChat;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Addresses one message log.
///
/// Without a conversation id this is the user's single active log
/// (`users/{uid}/messages`); with one it is a thread
/// (`users/{uid}/chats/{id}/messages`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationRef {
    pub owner_id: String,
    pub conversation_id: Option<String>,
}

impl ConversationRef {
    pub fn active_log(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            conversation_id: None,
        }
    }

    pub fn thread(owner_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }

    /// Document path of the message collection.
    pub fn collection_path(&self) -> String {
        match &self.conversation_id {
            Some(id) => format!("users/{}/chats/{}/messages", self.owner_id, id),
            None => format!("users/{}/messages", self.owner_id),
        }
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection_path())
    }
}

/// A thread container under `users/{uid}/chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Live feed of one message log.
///
/// Every delivery is the full ordered sequence, never a diff. Intermediate
/// snapshots may be coalesced, but the latest snapshot always contains every
/// committed write. Dropping the subscription (or calling
/// [`MessageSubscription::unsubscribe`]) releases the listener.
#[derive(Debug)]
pub struct MessageSubscription {
    receiver: watch::Receiver<Vec<Message>>,
}

impl MessageSubscription {
    pub fn new(receiver: watch::Receiver<Vec<Message>>) -> Self {
        Self { receiver }
    }

    /// The most recent snapshot, marking it as seen.
    pub fn current(&mut self) -> Vec<Message> {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store side of the feed has shut down.
    pub async fn next(&mut self) -> Option<Vec<Message>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Releases the listener.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

/// Append-only ordered message log.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a message and returns its store-assigned id.
    ///
    /// A missing `created_at` is filled with the server time. Hard backend
    /// failures surface as `AuraError::StoreUnavailable`; transient retries
    /// are the backend's concern.
    async fn append(&self, conversation: &ConversationRef, message: NewMessage) -> Result<String>;

    /// Opens a live feed of the ordered message sequence.
    async fn subscribe(&self, conversation: &ConversationRef) -> Result<MessageSubscription>;

    /// Deletes every message of the log in one atomic batch and returns how
    /// many were removed. On failure nothing is removed.
    async fn clear_all(&self, conversation: &ConversationRef) -> Result<usize>;

    /// Allocates a new thread container for `owner_id`.
    async fn create_conversation(&self, owner_id: &str, title: &str) -> Result<String>;

    /// Lists the threads of `owner_id`, newest first.
    async fn list_conversations(&self, owner_id: &str) -> Result<Vec<ConversationSummary>>;
}

/// Archive of saved conversation snapshots.
#[async_trait]
pub trait SavedChatRepository: Send + Sync {
    /// Durably writes `chat` and returns its id. Must not return before the
    /// write is committed.
    async fn save_chat(&self, owner_id: &str, chat: &SavedChat) -> Result<String>;

    /// Lists saved chats of `owner_id`, oldest first.
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<SavedChat>>;
}
