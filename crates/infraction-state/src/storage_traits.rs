//! Storage trait definitions for infractions
//!
//! `InfractionStore` is the single seam through which the moderation workflow
//! reads and writes infraction records. It is async and backend-agnostic; an
//! in-memory fake lives in the `fakes` module and a SurrealDB implementation
//! in `surreal_store`.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Platform user snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to an infraction by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfractionId(pub String);

impl InfractionId {
    /// Generate a new random InfractionId
    pub fn new() -> Self {
        InfractionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InfractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InfractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// InfractionKind
// ---------------------------------------------------------------------------

/// Kind of moderation action an infraction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfractionKind {
    Ban,
    Kick,
    VoiceBan,
}

impl InfractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfractionKind::Ban => "ban",
            InfractionKind::Kick => "kick",
            InfractionKind::VoiceBan => "voice_ban",
        }
    }

    /// Whether a freshly applied infraction of this kind stays in force.
    ///
    /// Kicks take effect once and are recorded inactive.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, InfractionKind::Kick)
    }
}

impl fmt::Display for InfractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfractionKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ban" => Ok(InfractionKind::Ban),
            "kick" => Ok(InfractionKind::Kick),
            "voice_ban" => Ok(InfractionKind::VoiceBan),
            other => Err(StorageError::Backend(format!(
                "unknown infraction kind: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Optional attributes attached when an infraction is posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionExtras {
    /// When set, the infraction is temporary and lapses at this instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Hidden infractions are not announced to the member.
    pub hidden: bool,
}

impl InfractionExtras {
    pub fn expiring_at(expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..Self::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Draft handed to [`InfractionStore::post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInfraction {
    pub user_id: UserId,
    pub actor_id: UserId,
    pub kind: InfractionKind,
    pub reason: Option<String>,
    pub active: bool,
    pub extras: InfractionExtras,
}

/// A persisted infraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infraction {
    pub id: InfractionId,
    pub kind: InfractionKind,
    pub user_id: UserId,
    pub actor_id: UserId,
    pub reason: Option<String>,
    pub active: bool,
    pub hidden: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub inserted_at: DateTime<Utc>,
}

impl Infraction {
    /// Materialise a draft into a record with a fresh id.
    pub fn from_draft(draft: NewInfraction) -> Self {
        Infraction {
            id: InfractionId::new(),
            kind: draft.kind,
            user_id: draft.user_id,
            actor_id: draft.actor_id,
            reason: draft.reason,
            active: draft.active,
            hidden: draft.extras.hidden,
            expires_at: draft.extras.expires_at,
            inserted_at: Utc::now(),
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.expires_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// InfractionStore
// ---------------------------------------------------------------------------

/// Infraction persistence.
///
/// Guarantees:
/// - At most one `active` infraction exists per `(user_id, kind)`. `post`
///   enforces this atomically and fails with `StorageError::DuplicateActive`
///   instead of creating a second one.
/// - Records are never deleted; `deactivate` is the only mutation.
/// - `post` is not idempotent for inactive drafts: each call creates a record.
#[async_trait]
pub trait InfractionStore: Send + Sync {
    /// The active infraction of `kind` for `user_id`, if any.
    async fn active(
        &self,
        user_id: UserId,
        kind: InfractionKind,
    ) -> StorageResult<Option<Infraction>>;

    /// Persist a new infraction and return the stored record.
    async fn post(&self, draft: NewInfraction) -> StorageResult<Infraction>;

    /// Mark an infraction inactive and return the updated record.
    ///
    /// Deactivating an already inactive record succeeds unchanged.
    async fn deactivate(&self, id: &InfractionId) -> StorageResult<Infraction>;

    /// Fetch a record by id. Returns `StorageError::NotFound` if absent.
    async fn get(&self, id: &InfractionId) -> StorageResult<Infraction>;

    /// Every infraction recorded against a user, oldest first.
    async fn history(&self, user_id: UserId) -> StorageResult<Vec<Infraction>>;
}
