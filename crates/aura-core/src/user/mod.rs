//! User domain module.
//!
//! - `model`: profile document and the profile-setup form
//! - `repository`: profile persistence trait

mod model;
mod repository;

pub use model::{Behavior, ProfileDraft, UserProfile};
pub use repository::ProfileRepository;
