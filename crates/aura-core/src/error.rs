//! Error types for the Aura session engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Aura workspace.
///
/// The first group of variants is the user-facing taxonomy the conversation
/// engine surfaces; the second group covers infrastructure failures that are
/// converted into the first group at operation boundaries.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraError {
    /// No authenticated user; the caller should redirect to sign-in.
    #[error("Authentication required")]
    AuthRequired,

    /// The signed-in user has no completed profile; redirect to profile setup.
    #[error("Profile missing for user '{user_id}'")]
    ProfileMissing { user_id: String },

    /// The document store rejected or could not complete an operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A sensitive account change requires the user to sign in again.
    #[error("Recent login required: {instruction}")]
    SensitiveActionRequiresReauth { instruction: String },

    /// The generative model call failed. Never shown as a dialog; the session
    /// degrades it into a fallback reply.
    #[error("AI request failed: {0}")]
    AiRequestFailed(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Input rejected by a service-level check (profile form, signup form).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session is not in a state that accepts the requested operation.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuraError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn profile_missing(user_id: impl Into<String>) -> Self {
        Self::ProfileMissing {
            user_id: user_id.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn reauth_required(instruction: impl Into<String>) -> Self {
        Self::SensitiveActionRequiresReauth {
            instruction: instruction.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    pub fn is_profile_missing(&self) -> bool {
        matches!(self, Self::ProfileMissing { .. })
    }

    pub fn is_reauth_required(&self) -> bool {
        matches!(self, Self::SensitiveActionRequiresReauth { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error should redirect the user away from the conversation
    /// view (to sign-in or profile setup) instead of being shown inline.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::ProfileMissing { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AuraError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AuraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AuraError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AuraError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, AuraError>`.
pub type Result<T> = std::result::Result<T, AuraError>;
