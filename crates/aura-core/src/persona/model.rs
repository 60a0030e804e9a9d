//! Persona domain model.
//!
//! Aura and Jert are two identities of the same companion. They share one
//! transcript and one memory; only the voice and the accent color differ.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two companion identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Persona {
    /// Female persona, the default when no male companion is preferred.
    #[default]
    Aura,
    /// Male persona.
    Jert,
}

impl Persona {
    pub fn name(&self) -> &'static str {
        match self {
            Persona::Aura => "Aura",
            Persona::Jert => "Jert",
        }
    }

    /// Gender the persona presents as in the system instruction.
    pub fn gender(&self) -> &'static str {
        match self {
            Persona::Aura => "female",
            Persona::Jert => "male",
        }
    }

    /// The other persona.
    pub fn counterpart(&self) -> Persona {
        match self {
            Persona::Aura => Persona::Jert,
            Persona::Jert => Persona::Aura,
        }
    }

    pub fn color(&self) -> ColorToken {
        match self {
            Persona::Aura => ColorToken::PURPLE,
            Persona::Jert => ColorToken::BLUE,
        }
    }

    /// Lowercase cue a user types to switch to this persona.
    pub fn cue(&self) -> &'static str {
        match self {
            Persona::Aura => "aura",
            Persona::Jert => "jert",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accent color a UI uses for the active persona (hex RGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorToken(&'static str);

impl ColorToken {
    pub const PURPLE: ColorToken = ColorToken("#9333ea");
    pub const BLUE: ColorToken = ColorToken("#2563eb");

    pub fn hex(&self) -> &'static str {
        self.0
    }
}

/// Derived persona value held by a conversation session.
///
/// Never persisted on its own; always recomputed from the profile and the last
/// override cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonaState {
    pub name: Persona,
    pub color: ColorToken,
}

impl From<Persona> for PersonaState {
    fn from(persona: Persona) -> Self {
        Self {
            name: persona,
            color: persona.color(),
        }
    }
}

impl Default for PersonaState {
    fn default() -> Self {
        Persona::default().into()
    }
}
