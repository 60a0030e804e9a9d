mod common;

use aura_application::{ConversationScope, ConversationSession, DeliveryStatus, SendOutcome};
use aura_core::AuraError;
use aura_core::ai::{AiFailure, Role};
use aura_core::config::DEFAULT_FALLBACK_MESSAGE;
use aura_core::persona::Persona;
use aura_core::prompt::behavior_directive;
use aura_core::session::{SessionState, Sender};
use aura_core::user::Behavior;
use common::{Harness, ScriptedAi, wait_for_view};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn all_confirmed(count: usize) -> impl Fn(&aura_application::SessionView) -> bool {
    move |view| {
        view.messages.len() == count
            && view
                .messages
                .iter()
                .all(|m| m.status == DeliveryStatus::Confirmed)
    }
}

#[tokio::test]
async fn test_start_without_profile_awaits_setup() {
    let harness = Harness::new();
    let session = ConversationSession::new(harness.context(), ConversationScope::ActiveLog);

    let err = session.start().await.unwrap_err();
    assert!(err.is_profile_missing());
    assert_eq!(session.state(), SessionState::AwaitingProfile);
    assert!(matches!(
        session.send_message("hello").await,
        Err(AuraError::ProfileMissing { .. })
    ));

    harness.save_profile("woman", Behavior::Standard).await;
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.persona().name, Persona::Aura);
}

#[tokio::test]
async fn test_stressed_user_gets_jert_in_ghetto_mode() {
    let harness = Harness::new();
    harness.ai.reply("Aw nah, what happened? Spill it.");
    let session = harness.started("man", Behavior::Ghetto).await;

    let outcome = session.send_message("I'm so stressed").await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Delivered {
            reply: "Aw nah, what happened? Spill it.".into(),
            persona: Persona::Jert,
            degraded: false,
        }
    );

    let calls = harness.ai.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert!(call.instruction.contains(behavior_directive(Behavior::Ghetto)));
    assert!(call.instruction.contains("'Jert', an empathetic male friend"));
    assert_eq!(call.transcript.len(), 1);
    assert_eq!(call.transcript[0].role, Role::User);
    assert_eq!(call.transcript[0].text, "I'm so stressed");

    let view = wait_for_view(&session, all_confirmed(2)).await;
    assert_eq!(view.state, SessionState::Ready);
    assert!(!view.loading);
    assert_eq!(view.messages[0].sender, Sender::User);
    assert_eq!(view.messages[1].sender, Sender::Ai);
    assert_eq!(view.persona.color.hex(), "#2563eb");
}

#[tokio::test]
async fn test_naming_aura_switches_before_prompt_is_composed() {
    let harness = Harness::new();
    let session = harness.started("man", Behavior::Standard).await;

    session.send_message("hey").await.unwrap();
    let outcome = session.send_message("talk to aura instead").await.unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Delivered {
            persona: Persona::Aura,
            ..
        }
    ));

    let calls = harness.ai.calls();
    assert!(calls[0].instruction.contains("persona is 'Jert'"));
    assert!(calls[1].instruction.contains("persona is 'Aura'"));
    assert_eq!(session.persona().name, Persona::Aura);

    // Transcript carries the shared history plus the new text.
    let roles: Vec<Role> = calls[1].transcript.iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Model, Role::User]);
}

#[tokio::test]
async fn test_model_failure_persists_fallback_reply() {
    let harness = Harness::new();
    harness.ai.fail(AiFailure::Status {
        status: 500,
        message: "internal".into(),
    });
    let session = harness.started("woman", Behavior::Standard).await;

    let outcome = session.send_message("hello?").await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Delivered {
            reply: DEFAULT_FALLBACK_MESSAGE.into(),
            persona: Persona::Aura,
            degraded: true,
        }
    );
    assert_eq!(session.state(), SessionState::Ready);

    let stored = harness.store.messages(&Harness::active_log()).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].sender, Sender::Ai);
    assert_eq!(stored[1].text, DEFAULT_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_blank_input_is_skipped_without_writes() {
    let harness = Harness::new();
    let session = harness.started("woman", Behavior::Standard).await;

    assert_eq!(session.send_message("   \n\t").await.unwrap(), SendOutcome::Skipped);
    assert_eq!(session.send_message("").await.unwrap(), SendOutcome::Skipped);

    assert_eq!(session.state(), SessionState::Ready);
    assert!(harness.store.messages(&Harness::active_log()).unwrap().is_empty());
    assert!(harness.ai.calls().is_empty());
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn test_store_failure_keeps_local_message() {
    let harness = Harness::new();
    let session = harness.started("woman", Behavior::Standard).await;
    harness.flaky.fail_append.store(true, Ordering::SeqCst);

    let err = session.send_message("are you there").await.unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(harness.ai.calls().is_empty());

    let view = session.view();
    assert_eq!(view.state, SessionState::Ready);
    assert!(!view.loading);
    assert_eq!(view.last_error.as_ref().map(AuraError::is_store_unavailable), Some(true));
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].text, "are you there");
    assert_eq!(view.messages[0].status, DeliveryStatus::Failed);

    // The next send works and clears the error.
    harness.flaky.fail_append.store(false, Ordering::SeqCst);
    session.send_message("retrying").await.unwrap();
    let view = wait_for_view(&session, |v| {
        v.messages
            .iter()
            .filter(|m| m.status == DeliveryStatus::Confirmed)
            .count()
            == 2
    })
    .await;
    assert_eq!(view.messages.len(), 3);
    assert!(view.last_error.is_none());

    // Display order is creation order, unsent entries included.
    assert_eq!(view.messages[0].text, "are you there");
    assert_eq!(view.messages[0].status, DeliveryStatus::Failed);
    assert_eq!(view.messages[1].text, "retrying");
    assert!(
        view.messages
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_send_is_reported_busy() {
    let (ai, gate) = ScriptedAi::gated();
    let harness = Harness::with_ai(ai);
    let session = Arc::new(harness.started("woman", Behavior::Standard).await);

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.send_message("first").await })
    };

    wait_for_view(&session, |v| v.state == SessionState::Sending && v.loading).await;
    assert_eq!(session.send_message("second").await.unwrap(), SendOutcome::Busy);

    gate.add_permits(1);
    assert!(matches!(
        first.await.unwrap().unwrap(),
        SendOutcome::Delivered { .. }
    ));

    let view = wait_for_view(&session, all_confirmed(2)).await;
    assert!(view.messages.iter().all(|m| m.text != "second"));
    assert_eq!(harness.ai.calls().len(), 1);
}

#[tokio::test]
async fn test_reload_profile_follows_preference_until_override() {
    let harness = Harness::new();
    let session = harness.started("woman", Behavior::Standard).await;
    assert_eq!(session.persona().name, Persona::Aura);

    harness.save_profile("man", Behavior::Standard).await;
    assert_eq!(session.reload_profile().await.unwrap().name, Persona::Jert);

    session.send_message("aura come back").await.unwrap();
    assert_eq!(session.persona().name, Persona::Aura);

    harness.save_profile("man", Behavior::Professional).await;
    assert_eq!(session.reload_profile().await.unwrap().name, Persona::Aura);
}

#[tokio::test]
async fn test_thread_is_created_on_first_send() {
    let harness = Harness::new();
    harness.save_profile("woman", Behavior::Standard).await;
    let session = ConversationSession::new(harness.context(), ConversationScope::new_thread());
    session.start().await.unwrap();
    assert!(harness.store_threads().await.is_empty());

    session
        .send_message("  Work has been a lot lately and I keep thinking about quitting  ")
        .await
        .unwrap();

    let threads = harness.store_threads().await;
    assert_eq!(threads.len(), 1);
    assert_eq!(
        threads[0].title,
        "Work has been a lot lately and I keep thinking about quittin"
    );
    assert_eq!(session.scope(), ConversationScope::Thread(Some(threads[0].id.clone())));

    wait_for_view(&session, all_confirmed(2)).await;
    assert!(harness.store.messages(&Harness::active_log()).unwrap().is_empty());

    session.send_message("second message").await.unwrap();
    assert_eq!(harness.store_threads().await.len(), 1);
}

#[tokio::test]
async fn test_close_releases_live_query() {
    let harness = Harness::new();
    let session = harness.started("woman", Behavior::Standard).await;
    assert_eq!(harness.store.listener_count(&Harness::active_log()), 1);

    session.close().await;
    assert_eq!(harness.store.listener_count(&Harness::active_log()), 0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_store_snapshots_from_other_writers_are_rendered() {
    use aura_core::session::{MessageStore, NewMessage};

    let harness = Harness::new();
    let session = harness.started("woman", Behavior::Standard).await;

    harness
        .store
        .append(&Harness::active_log(), NewMessage::ai("Good morning!"))
        .await
        .unwrap();

    let view = wait_for_view(&session, all_confirmed(1)).await;
    assert_eq!(view.messages[0].text, "Good morning!");
    assert!(view.messages[0].id.is_some());
    assert_eq!(view.messages[0].sender, Sender::Ai);
}
