use aura_core::ai::{Role, build_transcript};
use aura_core::persona::{Persona, PersonaResolver, PersonaState};
use aura_core::prompt::{ClauseKind, PromptComposer, behavior_directive};
use aura_core::session::{Message, Sender};
use aura_core::user::{Behavior, UserProfile};
use chrono::Utc;

fn profile(gender_pref: &str, behavior: Behavior) -> UserProfile {
    UserProfile {
        user_gender: Some("woman".into()),
        gender_pref: Some(gender_pref.into()),
        religion: Some("Christian".into()),
        behavior,
        email: "user@example.com".into(),
    }
}

fn message(sender: Sender, text: &str) -> Message {
    Message {
        id: format!("id-{text}"),
        text: text.into(),
        sender,
        created_at: Utc::now(),
        seq: 0,
        client_id: None,
    }
}

#[test]
fn stressed_user_with_male_preference_gets_jert() {
    let profile = profile("man", Behavior::Ghetto);
    let mut resolver = PersonaResolver::new();
    let persona = resolver.resolve(&profile, "I'm so stressed");
    assert_eq!(persona, Persona::Jert);

    let instruction = PromptComposer::new().compose(&profile, persona);
    assert!(instruction.contains("Your current persona is 'Jert', an empathetic male friend."));
    assert!(instruction.contains(behavior_directive(Behavior::Ghetto)));
    assert!(instruction.contains("You are speaking with a woman."));
    assert!(instruction.contains("Bible verse"));
}

#[test]
fn calling_aura_mid_conversation_switches_and_sticks() {
    let profile = profile("man", Behavior::Standard);
    let mut resolver = PersonaResolver::new();

    assert_eq!(resolver.resolve(&profile, "hey"), Persona::Jert);
    assert_eq!(resolver.resolve(&profile, "Aura, are you there?"), Persona::Aura);
    assert_eq!(resolver.resolve(&profile, "ok tell me more"), Persona::Aura);

    let state = PersonaState::from(resolver.current(&profile));
    assert_eq!(state.color.hex(), "#9333ea");
}

#[test]
fn instruction_changes_only_in_the_behavior_clause() {
    let composer = PromptComposer::new();
    let standard = composer.clauses(&profile("woman", Behavior::Standard), Persona::Aura);
    let professional = composer.clauses(&profile("woman", Behavior::Professional), Persona::Aura);

    assert_eq!(standard.len(), professional.len());
    for (a, b) in standard.iter().zip(professional.iter()) {
        assert_eq!(a.kind, b.kind);
        if a.kind == ClauseKind::Behavior {
            assert_ne!(a.text, b.text);
        } else {
            assert_eq!(a.text, b.text);
        }
    }
}

#[test]
fn transcript_is_shared_across_personas() {
    let history = vec![
        message(Sender::User, "hi"),
        message(Sender::Ai, "hey, Aura here"),
        message(Sender::User, "jert?"),
        message(Sender::Ai, "Jert here"),
    ];
    let transcript = build_transcript(&history, "both of you are great");

    let roles: Vec<Role> = transcript.iter().map(|entry| entry.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Model, Role::User, Role::Model, Role::User]
    );
    assert_eq!(transcript.last().map(|e| e.text.as_str()), Some("both of you are great"));
}
