//! Archived conversation snapshots.

use super::message::{Message, Sender};
use crate::persona::Persona;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a conversation, written under `users/{uid}/savedChats`.
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChat {
    pub saved_at: DateTime<Utc>,
    pub persona_at_save: Persona,
    pub title: String,
    pub messages: Vec<Message>,
}

impl SavedChat {
    /// Snapshots `messages` with a title taken from the first user message.
    pub fn snapshot(
        messages: Vec<Message>,
        persona: Persona,
        title_chars: usize,
        default_title: &str,
    ) -> Self {
        let title = chat_title(&messages, title_chars, default_title);
        Self {
            saved_at: Utc::now(),
            persona_at_save: persona,
            title,
            messages,
        }
    }
}

/// First user message cut to `max_chars` characters, or `default_title`.
pub fn chat_title(messages: &[Message], max_chars: usize, default_title: &str) -> String {
    messages
        .iter()
        .find(|m| m.sender == Sender::User)
        .map(|m| truncate_chars(&m.text, max_chars))
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title.to_string())
}

/// Truncates on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: Sender, text: &str) -> Message {
        Message {
            id: text.into(),
            text: text.into(),
            sender,
            created_at: Utc::now(),
            seq: 0,
            client_id: None,
        }
    }

    #[test]
    fn title_uses_first_user_message() {
        let messages = vec![
            message(Sender::Ai, "Hello there, how are you today?"),
            message(Sender::User, "I had a really long day at work and I need to vent"),
        ];
        assert_eq!(chat_title(&messages, 30, "Saved Chat"), "I had a really long day at wor");
    }

    #[test]
    fn title_falls_back_without_user_messages() {
        let messages = vec![message(Sender::Ai, "hi")];
        assert_eq!(chat_title(&messages, 30, "Saved Chat"), "Saved Chat");
        assert_eq!(chat_title(&[], 30, "Saved Chat"), "Saved Chat");
    }

    #[test]
    fn truncation_respects_multibyte_text() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
    }
}
