//! Render model of a conversation session and optimistic reconciliation.

use aura_core::AuraError;
use aura_core::persona::PersonaState;
use aura_core::session::{Message, NewMessage, SessionState, Sender};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a displayed message has reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Shown optimistically; the store has not delivered it yet.
    Pending,
    /// Part of the latest store snapshot.
    Confirmed,
    /// The write was rejected; kept locally so the text is not lost.
    Failed,
}

/// A message as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewMessage {
    /// Store id, once known.
    pub id: Option<String>,
    pub client_id: Option<String>,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl From<&Message> for ViewMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: Some(message.id.clone()),
            client_id: message.client_id.clone(),
            text: message.text.clone(),
            sender: message.sender,
            created_at: message.created_at,
            status: DeliveryStatus::Confirmed,
        }
    }
}

/// Snapshot published to session watchers on every change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: SessionState,
    pub persona: PersonaState,
    pub messages: Vec<ViewMessage>,
    /// Loading indicator; on for the whole send.
    pub loading: bool,
    pub last_error: Option<AuraError>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            persona: PersonaState::default(),
            messages: Vec::new(),
            loading: false,
            last_error: None,
        }
    }
}

/// Optimistic local copy of an outbound message.
#[derive(Debug, Clone)]
pub(crate) struct LocalMessage {
    pub id: Option<String>,
    pub client_id: String,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl LocalMessage {
    pub fn pending(message: &NewMessage) -> Self {
        Self {
            id: None,
            client_id: message.client_id.clone(),
            text: message.text.clone(),
            sender: message.sender,
            created_at: message.created_at.unwrap_or_else(Utc::now),
            status: DeliveryStatus::Pending,
        }
    }

    /// Whether `committed` is the store's version of this entry.
    pub fn is_confirmed_by(&self, committed: &Message) -> bool {
        self.id.as_deref() == Some(committed.id.as_str())
            || committed.client_id.as_deref() == Some(self.client_id.as_str())
            || (committed.text == self.text
                && committed.sender == self.sender
                && committed.created_at == self.created_at)
    }

    /// The committed form, once the store has assigned an id.
    pub fn to_committed(&self) -> Option<Message> {
        self.id.as_ref().map(|id| Message {
            id: id.clone(),
            text: self.text.clone(),
            sender: self.sender,
            created_at: self.created_at,
            seq: 0,
            client_id: Some(self.client_id.clone()),
        })
    }

    fn to_view(&self) -> ViewMessage {
        ViewMessage {
            id: self.id.clone(),
            client_id: Some(self.client_id.clone()),
            text: self.text.clone(),
            sender: self.sender,
            created_at: self.created_at,
            status: self.status,
        }
    }
}

/// Drops local entries the store has confirmed.
pub(crate) fn reconcile(confirmed: &[Message], local: &mut Vec<LocalMessage>) {
    local.retain(|entry| !confirmed.iter().any(|m| entry.is_confirmed_by(m)));
}

/// Confirmed and local entries ordered by `created_at`.
///
/// Ties keep store order, with local entries after confirmed ones.
pub(crate) fn merge(confirmed: &[Message], local: &[LocalMessage]) -> Vec<ViewMessage> {
    let mut merged: Vec<ViewMessage> = confirmed
        .iter()
        .map(ViewMessage::from)
        .chain(local.iter().map(LocalMessage::to_view))
        .collect();
    merged.sort_by_key(|message| message.created_at);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn committed(id: &str, client_id: Option<&str>, text: &str, secs: i64) -> Message {
        Message {
            id: id.into(),
            text: text.into(),
            sender: Sender::User,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            seq: 1,
            client_id: client_id.map(str::to_string),
        }
    }

    fn local(client_id: &str, text: &str, secs: i64) -> LocalMessage {
        LocalMessage {
            id: None,
            client_id: client_id.into(),
            text: text.into(),
            sender: Sender::User,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            status: DeliveryStatus::Pending,
        }
    }

    #[test]
    fn matches_on_store_id() {
        let mut entry = local("c1", "hi", 10);
        entry.id = Some("m1".into());
        assert!(entry.is_confirmed_by(&committed("m1", None, "other", 99)));
    }

    #[test]
    fn matches_on_client_id() {
        let entry = local("c1", "hi", 10);
        assert!(entry.is_confirmed_by(&committed("m1", Some("c1"), "hi", 99)));
        assert!(!entry.is_confirmed_by(&committed("m2", Some("c2"), "hi", 99)));
    }

    #[test]
    fn matches_on_content_and_timestamp() {
        let entry = local("c1", "hi", 10);
        assert!(entry.is_confirmed_by(&committed("m1", None, "hi", 10)));
        assert!(!entry.is_confirmed_by(&committed("m1", None, "hi", 11)));
    }

    #[test]
    fn confirmed_message_is_never_shown_twice() {
        let confirmed = vec![committed("m1", Some("c1"), "hi", 10)];
        let mut pending = vec![local("c1", "hi", 10), local("c2", "still going", 11)];

        reconcile(&confirmed, &mut pending);
        let view = merge(&confirmed, &pending);

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].status, DeliveryStatus::Confirmed);
        assert_eq!(view[1].text, "still going");
        assert_eq!(view[1].status, DeliveryStatus::Pending);
    }

    #[test]
    fn failed_entry_sorts_before_later_replies() {
        let confirmed = vec![
            committed("m1", Some("c2"), "later text", 20),
            committed("m2", None, "reply", 20),
        ];
        let mut failed = local("c1", "earlier text", 10);
        failed.status = DeliveryStatus::Failed;

        let view = merge(&confirmed, &[failed]);

        let texts: Vec<&str> = view.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["earlier text", "later text", "reply"]);
        assert_eq!(view[0].status, DeliveryStatus::Failed);
    }

    #[test]
    fn view_serializes_for_rendering() {
        let view = SessionView {
            messages: merge(&[], &[local("c1", "hi", 10)]),
            ..SessionView::default()
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["loading"], false);
        assert!(json["lastError"].is_null());
        assert_eq!(json["messages"][0]["clientId"], "c1");
        assert_eq!(json["messages"][0]["status"], "pending");
    }
}
