//! System instruction composition.

mod composer;

pub use composer::{ClauseKind, PromptClause, PromptComposer, behavior_directive};
