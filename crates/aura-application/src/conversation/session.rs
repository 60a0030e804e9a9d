//! Conversation session state machine.
//!
//! ```text
//! Idle -> AwaitingProfile -> Ready -> Sending -> Ready
//!                              \-> Archiving -> Ready
//! ```
//!
//! Sends and archiving are serialized by one guard; a second request while
//! one is running is answered with a busy outcome instead of queueing.

use super::context::{ConversationScope, SessionContext};
use super::view::{DeliveryStatus, LocalMessage, SessionView, ViewMessage, merge, reconcile};
use aura_core::ai::build_transcript;
use aura_core::persona::{Persona, PersonaResolver, PersonaState};
use aura_core::prompt::PromptComposer;
use aura_core::session::{
    ConversationRef, Message, MessageSubscription, NewMessage, SessionState, truncate_chars,
};
use aura_core::user::UserProfile;
use aura_core::{AuraError, Result};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result of [`ConversationSession::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Skipped,
    /// Another send or an archive is running; the input was not sent.
    Busy,
    /// Both the user message and the reply were persisted.
    Delivered {
        reply: String,
        persona: Persona,
        /// The model call failed and the fallback reply was used.
        degraded: bool,
    },
}

pub(crate) struct SessionCore {
    pub state: SessionState,
    pub scope: ConversationScope,
    pub conversation: Option<ConversationRef>,
    pub profile: Option<UserProfile>,
    pub resolver: PersonaResolver,
    pub confirmed: Vec<Message>,
    pub local: Vec<LocalMessage>,
    pub last_error: Option<AuraError>,
}

impl SessionCore {
    pub fn persona(&self) -> Persona {
        match &self.profile {
            Some(profile) => self.resolver.current(profile),
            None => Persona::default(),
        }
    }

    fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            persona: PersonaState::from(self.persona()),
            messages: merge(&self.confirmed, &self.local),
            loading: self.state.is_busy(),
            last_error: self.last_error.clone(),
        }
    }

    /// Every committed message, including writes the live query has not
    /// delivered yet, in display order.
    pub fn persisted_history(&self) -> Vec<Message> {
        let mut history = self.confirmed.clone();
        history.extend(
            self.local
                .iter()
                .filter(|entry| entry.status != DeliveryStatus::Failed)
                .filter_map(LocalMessage::to_committed),
        );
        // Stable: store order holds for equal timestamps.
        history.sort_by_key(|message| message.created_at);
        history
    }

    /// Local messages whose write failed.
    pub fn unsent_count(&self) -> usize {
        self.local
            .iter()
            .filter(|entry| entry.status == DeliveryStatus::Failed)
            .count()
    }

    /// Clears the local copies and returns how many of them were unsent.
    pub fn drop_local(&mut self) -> usize {
        let unsent = self.unsent_count();
        self.local.clear();
        unsent
    }

    fn set_local_status(&mut self, client_id: &str, id: Option<String>, status: DeliveryStatus) {
        if let Some(entry) = self.local.iter_mut().find(|e| e.client_id == client_id) {
            if id.is_some() {
                entry.id = id;
            }
            entry.status = status;
        }
        reconcile(&self.confirmed, &mut self.local);
    }
}

pub(crate) struct SessionInner {
    pub ctx: SessionContext,
    pub composer: PromptComposer,
    /// Held for the whole of a send or an archive.
    pub op_guard: tokio::sync::Mutex<()>,
    core: Mutex<SessionCore>,
    view_tx: watch::Sender<SessionView>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SessionInner {
    pub fn core(&self) -> Result<MutexGuard<'_, SessionCore>> {
        self.core
            .lock()
            .map_err(|_| AuraError::internal("session state lock poisoned"))
    }

    /// Applies `f` to the core state and publishes the resulting view.
    pub fn update<T>(&self, f: impl FnOnce(&mut SessionCore) -> T) -> Result<T> {
        let mut core = self.core()?;
        let result = f(&mut core);
        self.view_tx.send_replace(core.view());
        Ok(result)
    }

    /// Replaces the confirmed messages with a store snapshot.
    fn apply_store_snapshot(&self, conversation: &ConversationRef, snapshot: Vec<Message>) {
        let applied = self.update(|core| {
            if core.conversation.as_ref() != Some(conversation) {
                return false;
            }
            core.confirmed = snapshot;
            reconcile(&core.confirmed, &mut core.local);
            true
        });
        match applied {
            Ok(true) => {
                tracing::debug!("[ConversationSession] Store snapshot applied for {}", conversation)
            }
            Ok(false) => {
                tracing::debug!("[ConversationSession] Ignored stale snapshot for {}", conversation)
            }
            Err(e) => tracing::error!("[ConversationSession] Failed to apply snapshot: {}", e),
        }
    }

    /// Subscribes to `conversation` and replaces any running pump.
    pub async fn attach(self: &Arc<Self>, conversation: ConversationRef) -> Result<()> {
        let subscription = self
            .ctx
            .messages
            .subscribe(&conversation)
            .await
            .map_err(store_error)?;

        self.update(|core| {
            core.conversation = Some(conversation.clone());
        })?;

        let handle = tokio::spawn(run_pump(Arc::downgrade(self), conversation, subscription));
        if let Some(previous) = self.replace_pump(Some(handle)) {
            previous.abort();
        }
        Ok(())
    }

    /// Stops the live query and forgets the current log.
    pub fn detach(&self) -> Option<JoinHandle<()>> {
        if let Ok(mut core) = self.core() {
            core.conversation = None;
        }
        self.replace_pump(None)
    }

    /// Whether a live query is running.
    pub fn is_listening(&self) -> bool {
        match self.pump.lock() {
            Ok(pump) => pump.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(_) => false,
        }
    }

    fn replace_pump(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.pump.lock() {
            Ok(mut pump) => std::mem::replace(&mut *pump, handle),
            Err(_) => handle,
        }
    }
}

async fn run_pump(
    inner: Weak<SessionInner>,
    conversation: ConversationRef,
    mut subscription: MessageSubscription,
) {
    let initial = subscription.current();
    match inner.upgrade() {
        Some(session) => session.apply_store_snapshot(&conversation, initial),
        None => return,
    }

    while let Some(snapshot) = subscription.next().await {
        let Some(session) = inner.upgrade() else {
            break;
        };
        session.apply_store_snapshot(&conversation, snapshot);
    }
    tracing::debug!("[ConversationSession] Live query for {} ended", conversation);
}

/// Maps any store failure into the user-facing `StoreUnavailable` kind.
pub(crate) fn store_error(err: AuraError) -> AuraError {
    if err.is_store_unavailable() {
        err
    } else {
        AuraError::store_unavailable(err.to_string())
    }
}

/// One user's conversation over a single message log.
///
/// Dropping the session stops its live query.
pub struct ConversationSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession").finish_non_exhaustive()
    }
}

impl ConversationSession {
    pub fn new(ctx: SessionContext, scope: ConversationScope) -> Self {
        let core = SessionCore {
            state: SessionState::Idle,
            scope,
            conversation: None,
            profile: None,
            resolver: PersonaResolver::new(),
            confirmed: Vec::new(),
            local: Vec::new(),
            last_error: None,
        };
        let (view_tx, _) = watch::channel(core.view());

        Self {
            inner: Arc::new(SessionInner {
                ctx,
                composer: PromptComposer::new(),
                op_guard: tokio::sync::Mutex::new(()),
                core: Mutex::new(core),
                view_tx,
                pump: Mutex::new(None),
            }),
        }
    }

    /// Loads the profile and opens the live query.
    ///
    /// Fails with `ProfileMissing` (and stays in `AwaitingProfile`) when the
    /// user has not completed profile setup; call again afterwards.
    pub async fn start(&self) -> Result<()> {
        let _guard = self.inner.op_guard.lock().await;
        let scope = self.inner.update(|core| match core.state {
            SessionState::Idle | SessionState::AwaitingProfile => {
                core.state = SessionState::AwaitingProfile;
                Ok(core.scope.clone())
            }
            other => Err(AuraError::InvalidState(format!(
                "cannot start a session in state {other:?}"
            ))),
        })??;

        let profile = match self.fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                self.inner.update(|core| core.last_error = Some(e.clone()))?;
                return Err(e);
            }
        };

        if let Some(conversation) = scope.resolve(self.inner.ctx.owner_id()) {
            if let Err(e) = self.inner.attach(conversation).await {
                self.inner.update(|core| core.last_error = Some(e.clone()))?;
                return Err(e);
            }
        }

        let persona = self.inner.update(|core| {
            core.profile = Some(profile);
            core.state = SessionState::Ready;
            core.last_error = None;
            core.persona()
        })?;

        tracing::info!(
            "[ConversationSession] Ready for {} as {}",
            self.inner.ctx.owner_id(),
            persona
        );
        Ok(())
    }

    /// Re-reads the profile; the persona follows unless the user named one.
    pub async fn reload_profile(&self) -> Result<PersonaState> {
        let profile = self.fetch_profile().await?;
        let persona = self.inner.update(|core| {
            core.profile = Some(profile);
            core.persona()
        })?;
        tracing::info!("[ConversationSession] Profile reloaded; persona {}", persona);
        Ok(persona.into())
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        let owner_id = self.inner.ctx.owner_id();
        let profile = self
            .inner
            .ctx
            .profiles
            .find_profile(owner_id)
            .await
            .map_err(store_error)?;

        match profile {
            Some(profile) if profile.is_complete() => Ok(profile),
            _ => {
                tracing::info!("[ConversationSession] No completed profile for {}", owner_id);
                Err(AuraError::profile_missing(owner_id))
            }
        }
    }

    /// Sends one user message and persists the companion's reply.
    ///
    /// Blank input is skipped without any store write. A failed model call
    /// is degraded into the configured fallback reply. A failed store write
    /// keeps the local copy marked as failed and returns `StoreUnavailable`.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Skipped);
        }
        let Ok(_guard) = self.inner.op_guard.try_lock() else {
            tracing::debug!("[ConversationSession] Send rejected while busy");
            return Ok(SendOutcome::Busy);
        };

        let user_message = NewMessage::user(text);
        let client_id = user_message.client_id.clone();

        let (history, profile) = self.inner.update(|core| {
            match core.state {
                SessionState::Ready => {}
                SessionState::Idle | SessionState::AwaitingProfile => {
                    return Err(AuraError::profile_missing(self.inner.ctx.owner_id()));
                }
                other => {
                    return Err(AuraError::InvalidState(format!("cannot send in state {other:?}")));
                }
            }
            let profile = core
                .profile
                .clone()
                .ok_or_else(|| AuraError::profile_missing(self.inner.ctx.owner_id()))?;
            let history = core.persisted_history();
            core.state = SessionState::Sending;
            core.local.push(LocalMessage::pending(&user_message));
            Ok((history, profile))
        })??;

        let conversation = match self.ensure_conversation(text).await {
            Ok(conversation) => conversation,
            Err(e) => return self.fail_send(&client_id, e),
        };

        match self.inner.ctx.messages.append(&conversation, user_message).await {
            Ok(id) => {
                self.inner.update(|core| {
                    core.set_local_status(&client_id, Some(id), DeliveryStatus::Pending)
                })?;
            }
            Err(e) => return self.fail_send(&client_id, e),
        }

        let persona = self.inner.update(|core| core.resolver.resolve(&profile, text))?;
        let instruction = self.inner.composer.compose(&profile, persona);
        let transcript = build_transcript(&history, text);

        let (reply, degraded) = match self.inner.ctx.ai.generate(&transcript, &instruction).await {
            Ok(reply) if !reply.trim().is_empty() => (reply, false),
            Ok(_) => {
                tracing::warn!("[ConversationSession] Empty model reply; using fallback");
                (self.inner.ctx.settings.fallback_message.clone(), true)
            }
            Err(failure) => {
                tracing::warn!(
                    "[ConversationSession] {}; using fallback",
                    AuraError::AiRequestFailed(failure.to_string())
                );
                (self.inner.ctx.settings.fallback_message.clone(), true)
            }
        };

        let ai_message = NewMessage::ai(reply.clone());
        let ai_client_id = ai_message.client_id.clone();
        self.inner
            .update(|core| core.local.push(LocalMessage::pending(&ai_message)))?;

        match self.inner.ctx.messages.append(&conversation, ai_message).await {
            Ok(id) => {
                self.inner.update(|core| {
                    core.set_local_status(&ai_client_id, Some(id), DeliveryStatus::Pending);
                    core.state = SessionState::Ready;
                    core.last_error = None;
                })?;
            }
            Err(e) => return self.fail_send(&ai_client_id, e),
        }

        tracing::info!(
            "[ConversationSession] Reply delivered as {}{}",
            persona,
            if degraded { " (fallback)" } else { "" }
        );
        Ok(SendOutcome::Delivered {
            reply,
            persona,
            degraded,
        })
    }

    /// Resolves the log to write to.
    ///
    /// Only an unbound thread scope allocates a new conversation. A known log
    /// whose live query is down is subscribed again first.
    async fn ensure_conversation(&self, first_text: &str) -> Result<ConversationRef> {
        let (existing, scope) = {
            let core = self.inner.core()?;
            (core.conversation.clone(), core.scope.clone())
        };
        if let Some(conversation) = existing {
            if !self.inner.is_listening() {
                if let Err(e) = self.inner.attach(conversation.clone()).await {
                    tracing::warn!(
                        "[ConversationSession] Live query for {} still down: {}",
                        conversation,
                        e
                    );
                }
            }
            return Ok(conversation);
        }
        if let Some(conversation) = scope.resolve(self.inner.ctx.owner_id()) {
            self.inner.attach(conversation.clone()).await?;
            return Ok(conversation);
        }

        let title = truncate_chars(
            first_text.trim(),
            self.inner.ctx.settings.conversation_title_chars,
        );
        let owner_id = self.inner.ctx.owner_id().to_string();
        let id = self
            .inner
            .ctx
            .messages
            .create_conversation(&owner_id, &title)
            .await
            .map_err(store_error)?;

        let conversation = ConversationRef::thread(owner_id, id.clone());
        self.inner.update(|core| {
            core.scope = ConversationScope::Thread(Some(id));
        })?;
        self.inner.attach(conversation.clone()).await?;

        tracing::info!("[ConversationSession] Started thread {}", conversation);
        Ok(conversation)
    }

    fn fail_send(&self, client_id: &str, err: AuraError) -> Result<SendOutcome> {
        let err = store_error(err);
        tracing::warn!("[ConversationSession] Store write failed: {}", err);
        self.inner.update(|core| {
            core.set_local_status(client_id, None, DeliveryStatus::Failed);
            core.state = SessionState::Ready;
            core.last_error = Some(err.clone());
        })?;
        Err(err)
    }

    /// Subscribes to view updates. The receiver starts at the current view.
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.inner.view_tx.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.view().state
    }

    pub fn persona(&self) -> PersonaState {
        self.view().persona
    }

    pub fn messages(&self) -> Vec<ViewMessage> {
        self.view().messages
    }

    /// The scope the session currently writes to.
    pub fn scope(&self) -> ConversationScope {
        self.inner
            .core()
            .map(|core| core.scope.clone())
            .unwrap_or_default()
    }

    /// Stops the live query and waits until its listener is released.
    pub async fn close(&self) {
        if let Some(handle) = self.inner.detach() {
            handle.abort();
            let _ = handle.await;
        }
        let _ = self.inner.update(|core| core.state = SessionState::Idle);
        tracing::info!("[ConversationSession] Closed for {}", self.inner.ctx.owner_id());
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.detach() {
            handle.abort();
        }
    }
}
