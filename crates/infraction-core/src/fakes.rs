//! In-memory fakes for the platform-side collaborators (testing only)
//!
//! - `FakeGuild`: records every platform call, tracks members, roles and bans,
//!   and can be told to reject a given action.
//! - `RecordingContext`: command context that keeps every reply.
//! - `RecordingSuppressions`: suppression registry that keeps every call.
//! - `MemoryExpiryScheduler`: scheduler that remembers what is scheduled.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use infraction_state::{Infraction, InfractionId, UserId};

use crate::context::CommandContext;
use crate::error::{PlatformError, PlatformResult};
use crate::modlog::{LogEvent, SuppressionRegistry};
use crate::platform::{ActionKind, ActionOutcome, Guild, Member, RoleId};
use crate::scheduler::ExpiryScheduler;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// FakeGuild
// ---------------------------------------------------------------------------

/// A platform call observed by [`FakeGuild`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildCall {
    Ban {
        user_id: UserId,
        reason: Option<String>,
        delete_message_days: u8,
    },
    Unban {
        user_id: UserId,
        reason: Option<String>,
    },
    Kick {
        user_id: UserId,
        reason: Option<String>,
    },
    RemoveRole {
        user_id: UserId,
        role: RoleId,
        reason: Option<String>,
    },
    AddRole {
        user_id: UserId,
        role: RoleId,
        reason: Option<String>,
    },
    DirectMessage {
        user_id: UserId,
        content: String,
    },
}

impl GuildCall {
    /// Whether this call changes platform state (DMs do not).
    pub fn is_action(&self) -> bool {
        !matches!(self, GuildCall::DirectMessage { .. })
    }
}

#[derive(Debug, Default)]
pub struct FakeGuild {
    members: Mutex<HashMap<UserId, Member>>,
    banned: Mutex<HashSet<UserId>>,
    calls: Mutex<Vec<GuildCall>>,
    failures: Mutex<HashMap<ActionKind, PlatformError>>,
    dms_closed: AtomicBool,
}

impl FakeGuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, member: Member) {
        lock(&self.members).insert(member.id, member);
    }

    pub fn add_ban(&self, user_id: UserId) {
        lock(&self.banned).insert(user_id);
    }

    pub fn is_banned(&self, user_id: UserId) -> bool {
        lock(&self.banned).contains(&user_id)
    }

    pub fn member_snapshot(&self, user_id: UserId) -> Option<Member> {
        lock(&self.members).get(&user_id).cloned()
    }

    /// Reject every future `action` with `error`.
    pub fn fail(&self, action: ActionKind, error: PlatformError) {
        lock(&self.failures).insert(action, error);
    }

    pub fn close_dms(&self) {
        self.dms_closed.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GuildCall> {
        lock(&self.calls).clone()
    }

    /// Calls that change platform state.
    pub fn actions(&self) -> Vec<GuildCall> {
        self.calls().into_iter().filter(GuildCall::is_action).collect()
    }

    fn record(&self, call: GuildCall) {
        lock(&self.calls).push(call);
    }

    fn check(&self, action: ActionKind) -> PlatformResult<()> {
        match lock(&self.failures).get(&action) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn member_mut<R>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut Member) -> R,
    ) -> PlatformResult<R> {
        let mut members = lock(&self.members);
        let member = members
            .get_mut(&user_id)
            .ok_or_else(|| PlatformError::NotFound(format!("member {user_id}")))?;
        Ok(f(member))
    }
}

#[async_trait]
impl Guild for FakeGuild {
    async fn member(&self, user_id: UserId) -> PlatformResult<Option<Member>> {
        Ok(self.member_snapshot(user_id))
    }

    async fn ban(
        &self,
        user_id: UserId,
        reason: Option<&str>,
        delete_message_days: u8,
    ) -> PlatformResult<ActionOutcome> {
        self.record(GuildCall::Ban {
            user_id,
            reason: reason.map(str::to_string),
            delete_message_days,
        });
        self.check(ActionKind::Ban)?;
        lock(&self.members).remove(&user_id);
        lock(&self.banned).insert(user_id);
        Ok(ActionOutcome::new(ActionKind::Ban, user_id))
    }

    async fn unban(
        &self,
        user_id: UserId,
        reason: Option<&str>,
    ) -> PlatformResult<ActionOutcome> {
        self.record(GuildCall::Unban {
            user_id,
            reason: reason.map(str::to_string),
        });
        self.check(ActionKind::Unban)?;
        if !lock(&self.banned).remove(&user_id) {
            return Err(PlatformError::NotFound(format!("ban for {user_id}")));
        }
        Ok(ActionOutcome::new(ActionKind::Unban, user_id))
    }

    async fn kick(&self, user_id: UserId, reason: Option<&str>) -> PlatformResult<ActionOutcome> {
        self.record(GuildCall::Kick {
            user_id,
            reason: reason.map(str::to_string),
        });
        self.check(ActionKind::Kick)?;
        lock(&self.members)
            .remove(&user_id)
            .ok_or_else(|| PlatformError::NotFound(format!("member {user_id}")))?;
        Ok(ActionOutcome::new(ActionKind::Kick, user_id))
    }

    async fn remove_role(
        &self,
        user_id: UserId,
        role: RoleId,
        reason: Option<&str>,
    ) -> PlatformResult<ActionOutcome> {
        self.record(GuildCall::RemoveRole {
            user_id,
            role,
            reason: reason.map(str::to_string),
        });
        self.check(ActionKind::RemoveRole)?;
        self.member_mut(user_id, |m| m.roles.retain(|r| *r != role))?;
        Ok(ActionOutcome::new(ActionKind::RemoveRole, user_id))
    }

    async fn add_role(
        &self,
        user_id: UserId,
        role: RoleId,
        reason: Option<&str>,
    ) -> PlatformResult<ActionOutcome> {
        self.record(GuildCall::AddRole {
            user_id,
            role,
            reason: reason.map(str::to_string),
        });
        self.check(ActionKind::AddRole)?;
        self.member_mut(user_id, |m| {
            if !m.roles.contains(&role) {
                m.roles.push(role);
            }
        })?;
        Ok(ActionOutcome::new(ActionKind::AddRole, user_id))
    }

    async fn send_direct_message(&self, user_id: UserId, content: &str) -> PlatformResult<()> {
        self.record(GuildCall::DirectMessage {
            user_id,
            content: content.to_string(),
        });
        if self.dms_closed.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden(
                "cannot send messages to this user".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingContext
// ---------------------------------------------------------------------------

pub struct RecordingContext {
    actor: UserId,
    guild: Arc<FakeGuild>,
    sent: Mutex<Vec<String>>,
}

impl RecordingContext {
    pub fn new(actor: UserId, guild: Arc<FakeGuild>) -> Self {
        Self {
            actor,
            guild,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every reply sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl CommandContext for RecordingContext {
    fn actor(&self) -> UserId {
        self.actor
    }

    fn guild(&self) -> &dyn Guild {
        self.guild.as_ref()
    }

    async fn send(&self, content: &str) -> PlatformResult<()> {
        lock(&self.sent).push(content.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingSuppressions
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingSuppressions {
    ignored: Mutex<Vec<(LogEvent, UserId)>>,
    withdrawn: Mutex<Vec<(LogEvent, UserId)>>,
}

impl RecordingSuppressions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignored(&self) -> Vec<(LogEvent, UserId)> {
        lock(&self.ignored).clone()
    }

    pub fn withdrawn(&self) -> Vec<(LogEvent, UserId)> {
        lock(&self.withdrawn).clone()
    }
}

impl SuppressionRegistry for RecordingSuppressions {
    fn ignore(&self, event: LogEvent, user_id: UserId) {
        lock(&self.ignored).push((event, user_id));
    }

    fn withdraw(&self, event: LogEvent, user_id: UserId) {
        lock(&self.withdrawn).push((event, user_id));
    }
}

// ---------------------------------------------------------------------------
// MemoryExpiryScheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryExpiryScheduler {
    scheduled: Mutex<HashMap<InfractionId, DateTime<Utc>>>,
}

impl MemoryExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled_at(&self, id: &InfractionId) -> Option<DateTime<Utc>> {
        lock(&self.scheduled).get(id).copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.scheduled).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpiryScheduler for MemoryExpiryScheduler {
    fn schedule(&self, infraction: &Infraction) {
        if let Some(expires_at) = infraction.expires_at {
            lock(&self.scheduled).insert(infraction.id.clone(), expires_at);
        }
    }

    fn cancel(&self, id: &InfractionId) {
        lock(&self.scheduled).remove(id);
    }
}
