//! Domain layer of the Aura companion: personas, prompt composition, the
//! message model and the contracts of every external collaborator.

pub mod ai;
pub mod config;
pub mod error;
pub mod identity;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::{AuraError, Result};
