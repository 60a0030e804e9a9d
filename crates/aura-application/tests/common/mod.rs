#![allow(dead_code)]

use async_trait::async_trait;
use aura_application::{ConversationScope, ConversationSession, SessionContext, SessionView};
use aura_core::ai::{AiClient, AiFailure, TranscriptEntry};
use aura_core::config::SessionSettings;
use aura_core::identity::AuthUser;
use aura_core::session::{
    ConversationRef, ConversationSummary, MessageStore, MessageSubscription, NewMessage, SavedChat,
    SavedChatRepository,
};
use aura_core::user::{Behavior, ProfileRepository, UserProfile};
use aura_core::{AuraError, Result};
use aura_infrastructure::MemoryDocumentStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, watch};

pub const OWNER: &str = "user-1";

/// One recorded model call.
#[derive(Debug, Clone)]
pub struct AiCall {
    pub transcript: Vec<TranscriptEntry>,
    pub instruction: String,
}

/// Model client returning scripted replies, optionally held at a gate.
pub struct ScriptedAi {
    replies: Mutex<VecDeque<std::result::Result<String, AiFailure>>>,
    calls: Mutex<Vec<AiCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every call waits for a permit on the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut ai = Self::new();
        ai.gate = Some(gate.clone());
        (ai, gate)
    }

    pub fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self, failure: AiFailure) {
        self.replies.lock().unwrap().push_back(Err(failure));
    }

    pub fn calls(&self) -> Vec<AiCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for ScriptedAi {
    async fn generate(
        &self,
        transcript: &[TranscriptEntry],
        system_instruction: &str,
    ) -> std::result::Result<String, AiFailure> {
        self.calls.lock().unwrap().push(AiCall {
            transcript: transcript.to_vec(),
            instruction: system_instruction.to_string(),
        });
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("I'm here for you.".to_string()))
    }
}

/// Delegates to a [`MemoryDocumentStore`] with switchable write failures.
pub struct FlakyStore {
    pub inner: Arc<MemoryDocumentStore>,
    pub fail_append: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_clear: AtomicBool,
    pub fail_subscribe: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryDocumentStore>) -> Self {
        Self {
            inner,
            fail_append: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(AuraError::store_unavailable(format!("{operation} rejected")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for FlakyStore {
    async fn append(&self, conversation: &ConversationRef, message: NewMessage) -> Result<String> {
        Self::check(&self.fail_append, "append")?;
        self.inner.append(conversation, message).await
    }

    async fn subscribe(&self, conversation: &ConversationRef) -> Result<MessageSubscription> {
        Self::check(&self.fail_subscribe, "listen")?;
        self.inner.subscribe(conversation).await
    }

    async fn clear_all(&self, conversation: &ConversationRef) -> Result<usize> {
        Self::check(&self.fail_clear, "clear")?;
        self.inner.clear_all(conversation).await
    }

    async fn create_conversation(&self, owner_id: &str, title: &str) -> Result<String> {
        self.inner.create_conversation(owner_id, title).await
    }

    async fn list_conversations(&self, owner_id: &str) -> Result<Vec<ConversationSummary>> {
        self.inner.list_conversations(owner_id).await
    }
}

#[async_trait]
impl SavedChatRepository for FlakyStore {
    async fn save_chat(&self, owner_id: &str, chat: &SavedChat) -> Result<String> {
        Self::check(&self.fail_save, "save")?;
        self.inner.save_chat(owner_id, chat).await
    }

    async fn list_chats(&self, owner_id: &str) -> Result<Vec<SavedChat>> {
        self.inner.list_chats(owner_id).await
    }
}

pub struct Harness {
    pub store: Arc<MemoryDocumentStore>,
    pub flaky: Arc<FlakyStore>,
    pub ai: Arc<ScriptedAi>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ai(ScriptedAi::new())
    }

    pub fn with_ai(ai: ScriptedAi) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        Self {
            flaky: Arc::new(FlakyStore::new(store.clone())),
            store,
            ai: Arc::new(ai),
        }
    }

    pub fn user() -> AuthUser {
        AuthUser {
            uid: OWNER.into(),
            email: "sam@example.com".into(),
            display_name: None,
        }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            user: Self::user(),
            profiles: self.store.clone(),
            messages: self.flaky.clone(),
            saved_chats: self.flaky.clone(),
            ai: self.ai.clone(),
            settings: SessionSettings::default(),
        }
    }

    pub async fn save_profile(&self, gender_pref: &str, behavior: Behavior) {
        let profile = UserProfile {
            user_gender: Some("woman".into()),
            gender_pref: Some(gender_pref.into()),
            religion: None,
            behavior,
            email: "sam@example.com".into(),
        };
        self.store.save_profile(OWNER, &profile).await.unwrap();
    }

    /// A started session over the active log.
    pub async fn started(&self, gender_pref: &str, behavior: Behavior) -> ConversationSession {
        self.save_profile(gender_pref, behavior).await;
        let session = ConversationSession::new(self.context(), ConversationScope::ActiveLog);
        session.start().await.unwrap();
        session
    }

    pub async fn store_threads(&self) -> Vec<ConversationSummary> {
        self.store.list_conversations(OWNER).await.unwrap()
    }

    pub fn active_log() -> ConversationRef {
        ConversationRef::active_log(OWNER)
    }
}

/// Waits until the published view satisfies `predicate`.
pub async fn wait_for_view<F>(session: &ConversationSession, predicate: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    let mut rx: watch::Receiver<SessionView> = session.watch();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|view| predicate(view)))
        .await
        .expect("view condition within timeout")
        .expect("session view channel open")
        .clone()
}
