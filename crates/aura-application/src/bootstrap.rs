//! Composition root.

use crate::account_service::AccountService;
use crate::conversation::{ConversationScope, ConversationSession, SessionContext};
use crate::logging::init_logging;
use crate::profile_service::ProfileService;
use anyhow::{Context, Result};
use aura_core::ai::AiClient;
use aura_core::config::AuraConfig;
use aura_core::identity::{AuthUser, IdentityProvider};
use aura_core::session::{ConversationSummary, MessageStore, SavedChat, SavedChatRepository};
use aura_infrastructure::{AuraPaths, ConfigService, MemoryDocumentStore, MemoryIdentityProvider};
use aura_interaction::GeminiApiClient;
use std::sync::Arc;

/// Wired application services.
pub struct AppBootstrap {
    pub config: AuraConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<MemoryDocumentStore>,
    pub ai: Arc<dyn AiClient>,
    pub profile_service: Arc<ProfileService>,
    pub account_service: Arc<AccountService>,
}

impl AppBootstrap {
    /// Loads `config.toml` under `paths`, installs logging and wires services.
    pub fn load(paths: &AuraPaths) -> Result<Self> {
        let config_service = ConfigService::new(paths).context("Failed to resolve config path")?;
        let config = config_service
            .load()
            .with_context(|| format!("Failed to load {}", config_service.config_path().display()))?;

        init_logging(&config.logging);
        tracing::info!(
            "[Bootstrap] Configuration loaded from {}",
            config_service.config_path().display()
        );
        Self::from_config(config)
    }

    /// Wires config, identity, document store and the Gemini client.
    ///
    /// Without an API key the client still exists but every reply degrades to
    /// the fallback message.
    pub fn from_config(config: AuraConfig) -> Result<Self> {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(MemoryIdentityProvider::from_settings(&config.identity));
        let store = Arc::new(MemoryDocumentStore::new());

        let ai: Arc<dyn AiClient> = match GeminiApiClient::from_settings(&config.ai) {
            Ok(client) => {
                tracing::info!("[Bootstrap] Gemini client ready (model: {})", client.model());
                Arc::new(client)
            }
            Err(failure) => {
                tracing::warn!("[Bootstrap] {}; replies will use the fallback message", failure);
                Arc::new(
                    GeminiApiClient::new("", config.ai.model.clone())
                        .with_base_url(config.ai.endpoint.clone()),
                )
            }
        };

        let profile_service = Arc::new(ProfileService::new(store.clone()));
        let account_service = Arc::new(AccountService::new(identity.clone(), store.clone()));

        Ok(Self {
            config,
            identity,
            store,
            ai,
            profile_service,
            account_service,
        })
    }

    /// Replaces the model client.
    pub fn with_ai_client(mut self, ai: Arc<dyn AiClient>) -> Self {
        self.ai = ai;
        self
    }

    /// Session dependencies for `user`.
    pub fn session_context(&self, user: AuthUser) -> SessionContext {
        SessionContext {
            user,
            profiles: self.store.clone(),
            messages: self.store.clone(),
            saved_chats: self.store.clone(),
            ai: self.ai.clone(),
            settings: self.config.session.clone(),
        }
    }

    /// Opens and starts a session for the signed-in user.
    ///
    /// Fails with `AuthRequired` when nobody is signed in and with
    /// `ProfileMissing` before profile setup.
    pub async fn open_session(
        &self,
        scope: ConversationScope,
    ) -> aura_core::Result<ConversationSession> {
        let user = self.account_service.current_user().await?;
        let session = ConversationSession::new(self.session_context(user), scope);
        session.start().await?;
        Ok(session)
    }

    /// Threads of the signed-in user, newest first.
    pub async fn list_conversations(&self) -> aura_core::Result<Vec<ConversationSummary>> {
        let user = self.account_service.current_user().await?;
        self.store.list_conversations(&user.uid).await
    }

    /// Saved chats of the signed-in user, oldest first.
    pub async fn saved_chats(&self) -> aura_core::Result<Vec<SavedChat>> {
        let user = self.account_service.current_user().await?;
        self.store.list_chats(&user.uid).await
    }
}
