//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message.
///
/// Persona is deliberately not part of the sender: Aura and Jert share one
/// transcript, so every companion reply is simply `Ai`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn is_user(&self) -> bool {
        matches!(self, Sender::User)
    }
}

/// A message as committed to the store.
///
/// Immutable once written. `id` and `seq` are assigned by the store; `seq`
/// is the insertion order used to break `created_at` ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub seq: u64,
    /// Identifier chosen by the writing client, used to match optimistic
    /// local copies with their committed version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// A message about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub client_id: String,
    pub text: String,
    pub sender: Sender,
    /// Client-side timestamp. `None` asks the store for a server timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            created_at: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Sorts messages by `created_at`, then by store insertion order.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(id: &str, secs: i64, seq: u64) -> Message {
        Message {
            id: id.into(),
            text: id.into(),
            sender: Sender::User,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            seq,
            client_id: None,
        }
    }

    #[test]
    fn ties_break_on_insertion_order() {
        let mut messages = vec![message("c", 5, 3), message("b", 5, 2), message("a", 1, 9)];
        sort_messages(&mut messages);
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Sender::Ai).unwrap(), serde_json::json!("ai"));
        assert_eq!(serde_json::to_value(Sender::User).unwrap(), serde_json::json!("user"));
    }

    #[test]
    fn new_messages_get_unique_client_ids() {
        let a = NewMessage::user("hi");
        let b = NewMessage::user("hi");
        assert_ne!(a.client_id, b.client_id);
        assert!(a.created_at.is_none());
    }
}
