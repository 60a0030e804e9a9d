//! Profile setup.

use aura_core::identity::AuthUser;
use aura_core::user::{ProfileDraft, ProfileRepository, UserProfile};
use aura_core::{AuraError, Result};
use std::sync::Arc;

/// Shown when a mandatory profile selection is missing.
pub const PROFILE_INCOMPLETE_MESSAGE: &str =
    "Please select your gender, preferred companion, and a vibe.";

/// Reads and completes user profiles.
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Validates `draft` and stores it as the profile of `user`.
    ///
    /// The user's login email is stored alongside; religion is optional.
    pub async fn save_profile(&self, user: &AuthUser, draft: ProfileDraft) -> Result<UserProfile> {
        if !draft.is_filled() {
            return Err(AuraError::validation(PROFILE_INCOMPLETE_MESSAGE));
        }

        let profile = draft.into_profile(user.email.clone());
        self.profiles.save_profile(&user.uid, &profile).await?;
        tracing::info!(
            "[ProfileService] Profile saved for {} (behavior: {})",
            user.uid,
            profile.behavior
        );
        Ok(profile)
    }

    /// The stored profile, complete or not.
    pub async fn load_profile(&self, user: &AuthUser) -> Result<Option<UserProfile>> {
        self.profiles.find_profile(&user.uid).await
    }

    /// Whether `user` still has to go through profile setup.
    pub async fn needs_setup(&self, user: &AuthUser) -> Result<bool> {
        Ok(!self
            .load_profile(user)
            .await?
            .is_some_and(|profile| profile.is_complete()))
    }
}
