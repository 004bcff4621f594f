//! The chat platform as seen by the workflow: members, roles and the
//! guild-level action surface.

use std::fmt;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use infraction_state::UserId;

use crate::error::PlatformResult;

/// Platform role snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A guild member targeted by a moderation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub display_name: String,
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.push(role);
        self
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// Which platform call produced an [`ActionOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Ban,
    Unban,
    Kick,
    RemoveRole,
    AddRole,
}

/// Handle describing a completed platform action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: ActionKind,
    pub user_id: UserId,
}

impl ActionOutcome {
    pub fn new(action: ActionKind, user_id: UserId) -> Self {
        Self { action, user_id }
    }
}

/// A platform action that has been built but not yet run.
///
/// Nothing reaches the platform until the future is awaited.
pub type PendingAction<'a> = BoxFuture<'a, PlatformResult<ActionOutcome>>;

/// Guild-level action surface of the chat platform.
#[async_trait]
pub trait Guild: Send + Sync {
    /// Look up a member; `None` when the user is not in the guild.
    async fn member(&self, user_id: UserId) -> PlatformResult<Option<Member>>;

    async fn ban(
        &self,
        user_id: UserId,
        reason: Option<&str>,
        delete_message_days: u8,
    ) -> PlatformResult<ActionOutcome>;

    /// Fails with `PlatformError::NotFound` when the user is not banned.
    async fn unban(&self, user_id: UserId, reason: Option<&str>)
        -> PlatformResult<ActionOutcome>;

    async fn kick(&self, user_id: UserId, reason: Option<&str>) -> PlatformResult<ActionOutcome>;

    async fn remove_role(
        &self,
        user_id: UserId,
        role: RoleId,
        reason: Option<&str>,
    ) -> PlatformResult<ActionOutcome>;

    async fn add_role(
        &self,
        user_id: UserId,
        role: RoleId,
        reason: Option<&str>,
    ) -> PlatformResult<ActionOutcome>;

    /// Fails when the member has direct messages closed.
    async fn send_direct_message(&self, user_id: UserId, content: &str) -> PlatformResult<()>;
}
