//! System instruction assembly.
//!
//! The instruction is built from a fixed sequence of clauses. Each clause is
//! derived from a single input so that changing one profile field only
//! changes the clause that reads it.

use crate::persona::Persona;
use crate::user::{Behavior, UserProfile};

const STANDARD_DIRECTIVE: &str = "Your BEHAVIOR MODE is 'Standard'. Your tone is warm, empathetic, and friendly.";
const PROFESSIONAL_DIRECTIVE: &str = "Your BEHAVIOR MODE is 'Professional'. Your tone is formal and structured. Avoid slang.";
const GHETTO_DIRECTIVE: &str = "Your BEHAVIOR MODE is 'Ghetto'. Talk like a real, loyal, down-to-earth friend. Use AAVE (like 'sis,' 'spill the tea,' 'periodt') naturally. Your vibe is funny and direct.";
const SOCIAL_RULES: &str = "Social Rules: 1. If the user vents with insults, show solidarity first. 2. Then, gently ask if they want serious advice. 3. Follow their lead.";

/// Which part of the instruction a clause belongs to, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKind {
    Identity,
    Audience,
    Behavior,
    PersonaSwitch,
    Faith,
    SocialConduct,
}

/// A single rendered clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptClause {
    pub kind: ClauseKind,
    pub text: String,
}

impl PromptClause {
    fn new(kind: ClauseKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Tone directive for a behavior mode.
pub fn behavior_directive(behavior: Behavior) -> &'static str {
    match behavior {
        Behavior::Standard => STANDARD_DIRECTIVE,
        Behavior::Professional => PROFESSIONAL_DIRECTIVE,
        Behavior::Ghetto => GHETTO_DIRECTIVE,
    }
}

/// Builds the system instruction sent alongside every transcript.
///
/// `compose` is a pure function of `(profile, persona)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// Renders the full instruction text.
    pub fn compose(&self, profile: &UserProfile, persona: Persona) -> String {
        self.clauses(profile, persona)
            .into_iter()
            .map(|clause| clause.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Renders the instruction as ordered clauses. Clauses whose input is
    /// missing are left out.
    pub fn clauses(&self, profile: &UserProfile, persona: Persona) -> Vec<PromptClause> {
        let mut clauses = Vec::with_capacity(6);

        clauses.push(PromptClause::new(
            ClauseKind::Identity,
            format!(
                "You are an AI companion. Your current persona is '{name}', an empathetic {gender} friend. \
                 Your memory is shared between your Aura and Jert personas.",
                name = persona.name(),
                gender = persona.gender(),
            ),
        ));

        if let Some(gender) = non_blank(profile.user_gender.as_deref()) {
            clauses.push(PromptClause::new(
                ClauseKind::Audience,
                format!("You are speaking with a {gender}."),
            ));
        }

        clauses.push(PromptClause::new(
            ClauseKind::Behavior,
            behavior_directive(profile.behavior),
        ));

        clauses.push(PromptClause::new(
            ClauseKind::PersonaSwitch,
            format!(
                "You have counterparts: Aura (female) and Jert (male). \
                 The user may address either persona by name to switch; switch persona when asked. \
                 You are currently {name}; your counterpart is {other}.",
                name = persona.name(),
                other = persona.counterpart().name(),
            ),
        ));

        if is_christian(profile.religion.as_deref()) {
            clauses.push(PromptClause::new(
                ClauseKind::Faith,
                "The user is Christian; you can gently offer a relevant Bible verse.",
            ));
        }

        clauses.push(PromptClause::new(ClauseKind::SocialConduct, SOCIAL_RULES));
        clauses
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_christian(religion: Option<&str>) -> bool {
    religion.is_some_and(|r| r.to_lowercase().contains("christ"))
}
