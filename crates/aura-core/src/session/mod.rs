//! Session domain module.
//!
//! This module contains the message model, archived snapshots, the session
//! state enum and the store contracts the conversation engine runs against.
//!
//! # Module Structure
//!
//! - `message`: `Sender`, `Message`, `NewMessage`
//! - `saved_chat`: `SavedChat` snapshots and title rules
//! - `state`: `SessionState`
//! - `store`: `MessageStore`, `SavedChatRepository`, `MessageSubscription`

mod message;
mod saved_chat;
mod state;
mod store;

pub use message::{Message, NewMessage, Sender, sort_messages};
pub use saved_chat::{SavedChat, chat_title, truncate_chars};
pub use state::SessionState;
pub use store::{
    ConversationRef, ConversationSummary, MessageStore, MessageSubscription, SavedChatRepository,
};
