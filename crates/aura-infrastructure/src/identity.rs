//! In-process identity provider.

use async_trait::async_trait;
use aura_core::config::IdentitySettings;
use aura_core::identity::{AuthError, AuthUser, IdentityProvider};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Clone)]
struct LoginSession {
    uid: String,
    signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct IdentityState {
    accounts: Vec<Account>,
    current: Option<LoginSession>,
    password_resets: Vec<String>,
}

impl IdentityState {
    fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.user.email.eq_ignore_ascii_case(email))
    }

    fn current_account_mut(&mut self) -> Result<&mut Account, AuthError> {
        let uid = self
            .current
            .as_ref()
            .map(|session| session.uid.clone())
            .ok_or(AuthError::NotSignedIn)?;
        self.accounts
            .iter_mut()
            .find(|account| account.user.uid == uid)
            .ok_or(AuthError::NotSignedIn)
    }
}

/// Email/password accounts held in memory.
///
/// Email changes require the current login to be younger than the configured
/// recent-login window.
pub struct MemoryIdentityProvider {
    state: Mutex<IdentityState>,
    recent_login_window: Duration,
}

impl MemoryIdentityProvider {
    pub fn new(recent_login_window: Duration) -> Self {
        Self {
            state: Mutex::new(IdentityState::default()),
            recent_login_window,
        }
    }

    pub fn from_settings(settings: &IdentitySettings) -> Self {
        let window = std::time::Duration::from_secs(settings.recent_login_window_secs);
        Self::new(Duration::from_std(window).unwrap_or(Duration::MAX))
    }

    /// Moves the current login `by` into the past.
    pub fn backdate_login(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(session) = state.current.as_mut() {
                session.signed_in_at -= by;
            }
        }
    }

    /// Emails that password resets were dispatched to, oldest first.
    pub fn password_reset_requests(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.password_resets.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, IdentityState>, AuthError> {
        self.state
            .lock()
            .map_err(|_| AuthError::Backend("identity state lock poisoned".into()))
    }

    fn start_session(state: &mut IdentityState, uid: &str) {
        state.current = Some(LoginSession {
            uid: uid.to_string(),
            signed_in_at: Utc::now(),
        });
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn current_user(&self) -> Option<AuthUser> {
        let state = self.state.lock().ok()?;
        let uid = &state.current.as_ref()?.uid;
        state
            .accounts
            .iter()
            .find(|account| &account.user.uid == uid)
            .map(|account| account.user.clone())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim();
        let mut state = self.lock()?;
        if state.find_by_email(email).is_some() {
            return Err(AuthError::EmailInUse(email.to_string()));
        }

        let user = AuthUser {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: None,
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        Self::start_session(&mut state, &user.uid);

        tracing::info!("[MemoryIdentityProvider] Signed up {}", user.uid);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut state = self.lock()?;
        let user = match state.find_by_email(email.trim()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        Self::start_session(&mut state, &user.uid);

        tracing::info!("[MemoryIdentityProvider] Signed in {}", user.uid);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        if let Some(session) = state.current.take() {
            tracing::info!("[MemoryIdentityProvider] Signed out {}", session.uid);
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        // Unknown addresses succeed silently so accounts cannot be enumerated.
        let address = state
            .find_by_email(email.trim())
            .map(|account| account.user.email.clone());
        if let Some(address) = address {
            state.password_resets.push(address);
        }
        Ok(())
    }

    async fn update_display_name(&self, display_name: &str) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        let account = state.current_account_mut()?;
        account.user.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn update_email(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        let mut state = self.lock()?;

        let signed_in_at = state
            .current
            .as_ref()
            .map(|session| session.signed_in_at)
            .ok_or(AuthError::NotSignedIn)?;
        if Utc::now() - signed_in_at > self.recent_login_window {
            return Err(AuthError::RequiresRecentLogin);
        }

        let current_uid = state.current_account_mut()?.user.uid.clone();
        if state
            .find_by_email(email)
            .is_some_and(|other| other.user.uid != current_uid)
        {
            return Err(AuthError::EmailInUse(email.to_string()));
        }

        state.current_account_mut()?.user.email = email.to_string();
        tracing::info!("[MemoryIdentityProvider] Email updated for {}", current_uid);
        Ok(())
    }
}
