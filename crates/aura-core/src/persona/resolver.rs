//! Persona resolution from profile preference and in-message cues.

use super::model::Persona;
use crate::user::UserProfile;
use once_cell::sync::Lazy;
use regex::Regex;

static MALE_PREFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bman\b").expect("static regex is valid"));

/// Persona a fresh session starts with.
///
/// `Jert` when the preferred companion gender names "man" as a word ("man",
/// "Man (Jert)"), `Aura` otherwise, including for "woman".
pub fn initial_persona(profile: &UserProfile) -> Persona {
    match profile.gender_pref.as_deref() {
        Some(pref) if MALE_PREFERENCE.is_match(pref) => Persona::Jert,
        _ => Persona::Aura,
    }
}

/// Finds an explicit persona cue in user text.
///
/// Matching is a case-insensitive substring scan. "jert" is checked before
/// "aura", so a message naming both switches to Jert.
pub fn detect_override(text: &str) -> Option<Persona> {
    let lower = text.to_lowercase();
    [Persona::Jert, Persona::Aura]
        .into_iter()
        .find(|persona| lower.contains(persona.cue()))
}

/// Stateless form of the resolution rule: an override cue wins, otherwise the
/// prior persona is kept.
pub fn resolve_persona(prior: Persona, latest_user_text: &str) -> Persona {
    detect_override(latest_user_text).unwrap_or(prior)
}

/// Tracks the last override cue of a session.
///
/// The active persona is always `last_override` or, without one, the persona
/// implied by the profile. Keeping the cue instead of the resolved persona
/// means profile edits are picked up as long as the user never named a
/// persona explicitly.
#[derive(Debug, Clone, Default)]
pub struct PersonaResolver {
    last_override: Option<Persona>,
}

impl PersonaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active persona for `profile`.
    pub fn current(&self, profile: &UserProfile) -> Persona {
        self.last_override
            .unwrap_or_else(|| initial_persona(profile))
    }

    /// Applies `latest_user_text` and returns the persona for the next reply.
    pub fn resolve(&mut self, profile: &UserProfile, latest_user_text: &str) -> Persona {
        let prior = self.current(profile);
        if let Some(cue) = detect_override(latest_user_text) {
            if cue != prior {
                tracing::debug!("[PersonaResolver] Switching persona {} -> {}", prior, cue);
            }
            self.last_override = Some(cue);
        }
        self.current(profile)
    }

    pub fn last_override(&self) -> Option<Persona> {
        self.last_override
    }
}
