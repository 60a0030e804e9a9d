//! Account management on top of the identity provider.

use aura_core::identity::{AuthUser, IdentityProvider};
use aura_core::user::{ProfileRepository, UserProfile};
use aura_core::{AuraError, Result};
use std::sync::Arc;

/// What [`AccountService::update_account`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountUpdate {
    pub display_name_updated: bool,
    pub email_updated: bool,
}

impl AccountUpdate {
    pub fn is_noop(&self) -> bool {
        !self.display_name_updated && !self.email_updated
    }
}

/// Sign-up, sign-in and account settings.
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { identity, profiles }
    }

    /// The signed-in user, or `AuthRequired`.
    pub async fn current_user(&self) -> Result<AuthUser> {
        self.identity
            .current_user()
            .await
            .ok_or(AuraError::AuthRequired)
    }

    /// Creates the account and its signup profile document (email only).
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuraError::validation("Please enter an email and password."));
        }

        let user = self.identity.sign_up(email, password).await?;
        self.profiles
            .save_profile(&user.uid, &UserProfile::signup(user.email.clone()))
            .await?;

        tracing::info!("[AccountService] Account created for {}", user.uid);
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuraError::validation("Please enter an email and password."));
        }
        Ok(self.identity.sign_in(email, password).await?)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        Ok(())
    }

    /// Applies changed settings only.
    ///
    /// The display name is updated when it differs; the email only when it
    /// differs ignoring case. A stale login fails the email change with
    /// `SensitiveActionRequiresReauth`, after any display name change went
    /// through.
    pub async fn update_account(&self, display_name: &str, email: &str) -> Result<AccountUpdate> {
        let user = self.current_user().await?;
        let mut update = AccountUpdate::default();

        let display_name = display_name.trim();
        if !display_name.is_empty() && user.display_name.as_deref() != Some(display_name) {
            self.identity.update_display_name(display_name).await?;
            update.display_name_updated = true;
        }

        let email = email.trim();
        if !email.is_empty() && !email.eq_ignore_ascii_case(&user.email) {
            if let Err(e) = self.identity.update_email(email).await {
                let err = AuraError::from(e);
                tracing::warn!("[AccountService] Email change refused for {}: {}", user.uid, err);
                return Err(err);
            }
            update.email_updated = true;
        }

        if !update.is_noop() {
            tracing::info!("[AccountService] Account updated for {}: {:?}", user.uid, update);
        }
        Ok(update)
    }

    /// Sends a password reset to the signed-in user's email and returns it.
    pub async fn send_password_reset(&self) -> Result<String> {
        let user = self.current_user().await?;
        self.identity.send_password_reset(&user.email).await?;
        tracing::info!("[AccountService] Password reset dispatched for {}", user.uid);
        Ok(user.email)
    }
}
