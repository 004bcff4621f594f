//! Error types for infraction-state

use thiserror::Error;

/// Errors that can occur while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`crate::InfractionStore`] implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("infraction not found: {id}")]
    NotFound { id: String },

    #[error("user {user_id} already has an active {kind} infraction")]
    DuplicateActive { user_id: u64, kind: String },

    #[error("moderation data service unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}
