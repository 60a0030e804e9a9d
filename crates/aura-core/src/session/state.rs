//! Conversation session state machine states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a conversation session.
///
/// ```text
/// Idle -> AwaitingProfile -> Ready -> Sending -> Ready
///                              \-> Archiving -> Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created but not started.
    #[default]
    Idle,
    /// Waiting for the profile fetch.
    AwaitingProfile,
    /// Accepting sends and new-conversation requests.
    Ready,
    /// A send is in flight; the loading indicator is on.
    Sending,
    /// Snapshot-then-clear in progress.
    Archiving,
}

impl SessionState {
    /// Whether a UI should show its loading indicator.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Sending | SessionState::Archiving)
    }
}
