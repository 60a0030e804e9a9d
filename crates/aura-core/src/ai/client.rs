//! Generative model client contract.

use super::transcript::TranscriptEntry;
use async_trait::async_trait;
use thiserror::Error;

/// Why a generation request produced no text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiFailure {
    /// The request never got an HTTP response (DNS, connect, timeout).
    #[error("Request failed: {message}")]
    Transport { message: String, is_timeout: bool },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The body did not contain the expected text field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No API key or endpoint configured.
    #[error("AI client not configured: {0}")]
    NotConfigured(String),
}

impl AiFailure {
    /// Whether a later retry by the user has a reasonable chance to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AiFailure::Transport { .. } => true,
            AiFailure::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            AiFailure::MalformedResponse(_) | AiFailure::NotConfigured(_) => false,
        }
    }
}

/// Sends a transcript and a system instruction to the model.
///
/// One request per call, no retries and no persistence: the caller owns both.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(
        &self,
        transcript: &[TranscriptEntry],
        system_instruction: &str,
    ) -> Result<String, AiFailure>;
}
