//! Role-tagged transcript sent to the generative model.

use crate::session::{Message, Sender};
use serde::{Deserialize, Serialize};

/// Transcript role as understood by the model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Model,
        }
    }
}

/// One turn of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Maps prior messages to transcript turns and appends the outbound user text
/// as the final entry.
///
/// Both personas' replies become `model` turns; the transcript is shared.
pub fn build_transcript<'a, I>(history: I, latest_user_text: &str) -> Vec<TranscriptEntry>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut transcript: Vec<TranscriptEntry> = history
        .into_iter()
        .map(|message| TranscriptEntry {
            role: message.sender.into(),
            text: message.text.clone(),
        })
        .collect();
    transcript.push(TranscriptEntry::user(latest_user_text));
    transcript
}
