//! The conversation engine: one session per signed-in user and message log.

mod context;
mod lifecycle;
mod session;
mod view;

pub use context::{ConversationScope, SessionContext};
pub use lifecycle::{ArchiveChoice, ArchiveOutcome, ArchivePrompt, ArchiveRequest};
pub use session::{ConversationSession, SendOutcome};
pub use view::{DeliveryStatus, SessionView, ViewMessage};
