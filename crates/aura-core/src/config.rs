//! Application configuration model.
//!
//! Stored as `config.toml`; every field has a default so a missing or partial
//! file still yields a usable configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm having a little trouble connecting. Please try again.";

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuraConfig {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Generative model endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// API key. Prefer the `AURA_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Conversation engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Reply persisted when the model call fails.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default = "default_saved_chat_title_chars")]
    pub saved_chat_title_chars: usize,
    #[serde(default = "default_saved_chat_title")]
    pub default_saved_chat_title: String,
    #[serde(default = "default_conversation_title_chars")]
    pub conversation_title_chars: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            fallback_message: default_fallback_message(),
            saved_chat_title_chars: default_saved_chat_title_chars(),
            default_saved_chat_title: default_saved_chat_title(),
            conversation_title_chars: default_conversation_title_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// How long a login counts as recent for sensitive account changes.
    #[serde(default = "default_recent_login_window_secs")]
    pub recent_login_window_secs: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            recent_login_window_secs: default_recent_login_window_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

fn default_saved_chat_title_chars() -> usize {
    30
}

fn default_saved_chat_title() -> String {
    "Saved Chat".to_string()
}

fn default_conversation_title_chars() -> usize {
    60
}

fn default_recent_login_window_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}
