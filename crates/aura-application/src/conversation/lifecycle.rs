//! Starting a new conversation: the save / discard / cancel choice and the
//! snapshot-then-clear archive sequence.

use super::context::ConversationScope;
use super::session::{ConversationSession, store_error};
use async_trait::async_trait;
use aura_core::session::{SavedChat, SessionState, chat_title};
use aura_core::{AuraError, Result};

/// The user's answer when a non-empty conversation is about to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveChoice {
    /// Snapshot into saved chats, then clear.
    Save,
    /// Clear without a snapshot.
    Discard,
    /// Keep the conversation as is.
    Cancel,
}

/// What the user is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub message_count: usize,
    /// Local messages that never reached the store; they are not archived.
    pub unsent_count: usize,
    /// Title the snapshot would be saved under.
    pub title: String,
}

/// Asks the user whether to keep the current conversation.
#[async_trait]
pub trait ArchivePrompt: Send + Sync {
    async fn choose(&self, request: &ArchiveRequest) -> ArchiveChoice;
}

/// A fixed answer.
#[async_trait]
impl ArchivePrompt for ArchiveChoice {
    async fn choose(&self, _request: &ArchiveRequest) -> ArchiveChoice {
        *self
    }
}

/// Result of [`ConversationSession::start_new_conversation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The log was already empty.
    NothingToArchive,
    /// A send is in flight; nothing was done.
    Busy,
    Cancelled,
    /// `removed` counts deleted log messages; a detached thread deletes none.
    Discarded {
        removed: usize,
    },
    Saved {
        saved_chat_id: String,
        removed: usize,
    },
}

impl ConversationSession {
    /// Replaces the current conversation with an empty one.
    ///
    /// A non-empty log is first put to `prompt`. On save the snapshot is
    /// committed before anything is deleted; if the snapshot fails the log
    /// is untouched. If the clear fails after a committed snapshot, the
    /// snapshot stays and the log is kept as well.
    ///
    /// Threads are never deleted: a thread-scoped session detaches and the
    /// next send opens a new thread.
    pub async fn start_new_conversation(
        &self,
        prompt: &dyn ArchivePrompt,
    ) -> Result<ArchiveOutcome> {
        let Ok(_guard) = self.inner.op_guard.try_lock() else {
            return Ok(ArchiveOutcome::Busy);
        };

        let (messages, unsent_count, persona, conversation, is_thread) = {
            let core = self.inner.core()?;
            if core.state != SessionState::Ready {
                return Err(AuraError::InvalidState(format!(
                    "cannot start a new conversation in state {:?}",
                    core.state
                )));
            }
            (
                core.persisted_history(),
                core.unsent_count(),
                core.persona(),
                core.conversation.clone(),
                core.scope.is_thread(),
            )
        };
        if messages.is_empty() {
            // Only unsent local copies, if anything.
            let dropped = self.inner.update(|core| core.drop_local())?;
            log_dropped(dropped);
            return Ok(ArchiveOutcome::NothingToArchive);
        }

        let settings = &self.inner.ctx.settings;
        let request = ArchiveRequest {
            message_count: messages.len(),
            unsent_count,
            title: chat_title(
                &messages,
                settings.saved_chat_title_chars,
                &settings.default_saved_chat_title,
            ),
        };

        let choice = prompt.choose(&request).await;
        tracing::info!(
            "[SessionLifecycle] New conversation requested ({} messages): {:?}",
            request.message_count,
            choice
        );

        let saved_chat_id = match choice {
            ArchiveChoice::Cancel => return Ok(ArchiveOutcome::Cancelled),
            ArchiveChoice::Discard => None,
            ArchiveChoice::Save => {
                self.inner.update(|core| core.state = SessionState::Archiving)?;
                let chat = SavedChat::snapshot(
                    messages,
                    persona,
                    settings.saved_chat_title_chars,
                    &settings.default_saved_chat_title,
                );
                match self
                    .inner
                    .ctx
                    .saved_chats
                    .save_chat(self.inner.ctx.owner_id(), &chat)
                    .await
                {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::error!("[SessionLifecycle] Snapshot failed, log kept: {}", e);
                        return self.fail_archive(e);
                    }
                }
            }
        };

        self.inner.update(|core| core.state = SessionState::Archiving)?;

        let removed = if is_thread {
            if let Some(handle) = self.inner.detach() {
                handle.abort();
                let _ = handle.await;
            }
            self.inner
                .update(|core| core.scope = ConversationScope::new_thread())?;
            0
        } else {
            let Some(conversation) = conversation else {
                return self.fail_archive(AuraError::internal("active log is not attached"));
            };
            // No snapshot taken before the clear may be applied after it.
            if let Some(handle) = self.inner.detach() {
                handle.abort();
                let _ = handle.await;
            }
            let cleared = self.inner.ctx.messages.clear_all(&conversation).await;
            let reattached = self.inner.attach(conversation.clone()).await;
            if reattached.is_err() {
                // Stay bound to the active log; the next send subscribes again.
                self.inner.update(|core| {
                    core.conversation = Some(conversation.clone());
                    if cleared.is_ok() {
                        core.confirmed.clear();
                        log_dropped(core.drop_local());
                    }
                })?;
            }
            match cleared {
                Ok(removed) => {
                    if let Err(e) = reattached {
                        tracing::error!(
                            "[SessionLifecycle] Log cleared but not resubscribed: {}",
                            e
                        );
                        return self.fail_archive(e);
                    }
                    removed
                }
                Err(e) => {
                    tracing::error!(
                        "[SessionLifecycle] Clear failed after snapshot {:?}: {}",
                        saved_chat_id,
                        e
                    );
                    return self.fail_archive(e);
                }
            }
        };

        let dropped = self.inner.update(|core| {
            core.confirmed.clear();
            core.state = SessionState::Ready;
            core.last_error = None;
            core.drop_local()
        })?;
        log_dropped(dropped);

        Ok(match saved_chat_id {
            Some(saved_chat_id) => {
                tracing::info!(
                    "[SessionLifecycle] Saved chat {} and cleared {} messages",
                    saved_chat_id,
                    removed
                );
                ArchiveOutcome::Saved {
                    saved_chat_id,
                    removed,
                }
            }
            None => {
                tracing::info!("[SessionLifecycle] Discarded {} messages", removed);
                ArchiveOutcome::Discarded { removed }
            }
        })
    }

    fn fail_archive(&self, err: AuraError) -> Result<ArchiveOutcome> {
        let err = store_error(err);
        self.inner.update(|core| {
            core.state = SessionState::Ready;
            core.last_error = Some(err.clone());
        })?;
        Err(err)
    }
}

fn log_dropped(unsent: usize) {
    if unsent > 0 {
        tracing::warn!("[SessionLifecycle] Dropped {} unsent local message(s)", unsent);
    }
}
