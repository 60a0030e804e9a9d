//! Identity provider contract.
//!
//! Sign-up, sign-in and credential management are delegated to an external
//! provider. The engine only needs the signed-in user and a handful of
//! account operations.

use crate::error::AuraError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instruction shown when a sensitive change needs a fresh login.
pub const REAUTH_INSTRUCTION: &str =
    "For your security, please log out and log back in before changing your email.";

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Failures reported by the identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use: {0}")]
    EmailInUse(String),

    /// The operation needs a login more recent than the provider's window.
    #[error("Recent login required")]
    RequiresRecentLogin,

    #[error("Identity backend error: {0}")]
    Backend(String),
}

impl From<AuthError> for AuraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotSignedIn => AuraError::AuthRequired,
            AuthError::RequiresRecentLogin => AuraError::reauth_required(REAUTH_INSTRUCTION),
            AuthError::InvalidCredentials | AuthError::EmailInUse(_) => {
                AuraError::Validation(err.to_string())
            }
            AuthError::Backend(message) => AuraError::Internal(message),
        }
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    async fn current_user(&self) -> Option<AuthUser>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Dispatches a password-reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    async fn update_display_name(&self, display_name: &str) -> Result<(), AuthError>;

    /// Changes the login email. Sensitive: fails with
    /// [`AuthError::RequiresRecentLogin`] when the login is stale.
    async fn update_email(&self, email: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_into_taxonomy() {
        assert_eq!(AuraError::from(AuthError::NotSignedIn), AuraError::AuthRequired);
        assert!(AuraError::from(AuthError::RequiresRecentLogin).is_reauth_required());
        assert!(matches!(
            AuraError::from(AuthError::InvalidCredentials),
            AuraError::Validation(_)
        ));
    }
}
