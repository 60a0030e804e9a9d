//! Generative model boundary.

mod client;
mod transcript;

pub use client::{AiClient, AiFailure};
pub use transcript::{Role, TranscriptEntry, build_transcript};
