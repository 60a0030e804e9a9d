//! Profile repository trait.

use super::model::UserProfile;
use crate::error::Result;
use async_trait::async_trait;

/// Access to the `users/{uid}` profile documents.
///
/// Profiles are only ever written by their owner and are never deleted by the
/// client, so the contract has no delete operation.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds the profile of `user_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UserProfile))`: Profile document exists
    /// - `Ok(None)`: No document for this user
    /// - `Err(_)`: The store could not be reached
    async fn find_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Replaces the profile document of `user_id`.
    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()>;
}
