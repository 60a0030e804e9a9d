//! Persona domain module.
//!
//! - `model`: the two personas and their derived display state
//! - `resolver`: initial persona and in-message override cues

mod model;
mod resolver;

pub use model::{ColorToken, Persona, PersonaState};
pub use resolver::{PersonaResolver, detect_override, initial_persona, resolve_persona};
