//! Error taxonomy for the infraction workflow.
//!
//! Expected outcomes (missing precondition, duplicate infraction, recorder
//! failure) are not errors; they come back as [`crate::ApplyOutcome`]
//! variants. Only platform and storage failures surface here.

use infraction_state::{InfractionId, InfractionKind, StorageError};

/// Errors reported by the chat platform's action surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("missing permissions: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("platform request failed: {0}")]
    Http(String),
}

/// Result type for platform calls.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Errors produced while loading [`crate::InfractionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("environment variable {0} not set")]
    MissingVar(String),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: String, value: String },
}

/// Workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum InfractionError {
    /// The platform rejected the action after the infraction was recorded.
    /// The record is left in place; `infraction_id` identifies it.
    #[error("failed to apply {kind} infraction {infraction_id}: {source}")]
    ActionFailed {
        infraction_id: InfractionId,
        kind: InfractionKind,
        source: PlatformError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, InfractionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn action_failed_names_record_and_cause() {
        let err = InfractionError::ActionFailed {
            infraction_id: InfractionId("abc".to_string()),
            kind: InfractionKind::Ban,
            source: PlatformError::Forbidden("role hierarchy".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("ban"));
        assert!(msg.contains("abc"));
        assert!(msg.contains("role hierarchy"));
        assert!(err.source().is_some());
    }

    #[test]
    fn storage_errors_convert() {
        let err: InfractionError = StorageError::Unavailable("down".to_string()).into();
        assert!(err.to_string().contains("storage error"));
    }
}
