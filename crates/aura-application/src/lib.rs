pub mod account_service;
pub mod bootstrap;
pub mod conversation;
pub mod logging;
pub mod profile_service;

pub use account_service::{AccountService, AccountUpdate};
pub use bootstrap::AppBootstrap;
pub use conversation::{
    ArchiveChoice, ArchiveOutcome, ArchivePrompt, ArchiveRequest, ConversationScope,
    ConversationSession, DeliveryStatus, SendOutcome, SessionContext, SessionView, ViewMessage,
};
pub use logging::init_logging;
pub use profile_service::{PROFILE_INCOMPLETE_MESSAGE, ProfileService};
