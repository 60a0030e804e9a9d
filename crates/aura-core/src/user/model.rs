//! UserProfile domain model.
//!
//! A profile is created at signup carrying only the email address and is
//! completed during profile setup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversational tone the user picked for the companion.
///
/// Unknown values read from storage fall back to [`Behavior::Standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Behavior {
    #[default]
    Standard,
    Professional,
    Ghetto,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Standard => "standard",
            Behavior::Professional => "professional",
            Behavior::Ghetto => "ghetto",
        }
    }

    /// Case-insensitive parse that never fails.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "professional" => Behavior::Professional,
            "ghetto" => Behavior::Ghetto,
            _ => Behavior::Standard,
        }
    }
}

impl From<String> for Behavior {
    fn from(value: String) -> Self {
        Behavior::parse_lenient(&value)
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile document stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's own declared gender (free text such as "woman" or "man").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_gender: Option<String>,
    /// Preferred companion gender; drives the initial persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_pref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(default)]
    pub behavior: Behavior,
    #[serde(default)]
    pub email: String,
}

impl UserProfile {
    /// The document written at signup, before profile setup.
    pub fn signup(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Whether profile setup has been completed.
    ///
    /// Signup documents only carry the email; the conversation engine treats
    /// those as missing and redirects to setup.
    pub fn is_complete(&self) -> bool {
        has_text(&self.user_gender) && has_text(&self.gender_pref)
    }
}

/// Form values submitted from profile setup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileDraft {
    pub user_gender: String,
    pub gender_pref: String,
    pub religion: String,
    pub behavior: String,
}

impl ProfileDraft {
    /// Whether the mandatory selections were made.
    pub fn is_filled(&self) -> bool {
        !self.user_gender.trim().is_empty()
            && !self.gender_pref.trim().is_empty()
            && !self.behavior.trim().is_empty()
    }

    /// Builds the profile document for `email`.
    pub fn into_profile(self, email: impl Into<String>) -> UserProfile {
        let religion = self.religion.trim().to_string();
        UserProfile {
            user_gender: Some(self.user_gender.trim().to_string()),
            gender_pref: Some(self.gender_pref.trim().to_string()),
            religion: (!religion.is_empty()).then_some(religion),
            behavior: Behavior::parse_lenient(&self.behavior),
            email: email.into(),
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
