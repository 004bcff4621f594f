//! The infraction workflow.
//!
//! ```text
//! command ─► normalize reason ─► precondition ─► guard ─► recorder ─► coordinator
//! ```
//!
//! Each step may end the apply early with an [`ApplyOutcome`] sentinel after
//! telling the moderator why. Only a platform failure after the infraction
//! was recorded is an error.

use std::sync::Arc;

use tracing::Instrument;

use infraction_state::{Infraction, InfractionExtras, InfractionStore};

use crate::action::{InfractionAction, Precondition};
use crate::config::InfractionConfig;
use crate::context::CommandContext;
use crate::error::Result;
use crate::guard::get_active_infraction;
use crate::metrics::METRICS;
use crate::modlog::SuppressionRegistry;
use crate::obs;
use crate::platform::Member;
use crate::reason;
use crate::recorder::post_infraction;
use crate::scheduler::ExpiryScheduler;

/// How an apply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Recorded and carried out.
    Applied(Infraction),
    /// The kind's precondition does not hold for this member.
    PreconditionFailed,
    /// The member already has an active infraction of this kind.
    AlreadyActive(Infraction),
    /// The store refused or failed; no action was taken.
    RecordFailed,
}

impl ApplyOutcome {
    pub fn applied(&self) -> Option<&Infraction> {
        match self {
            ApplyOutcome::Applied(infraction) => Some(infraction),
            _ => None,
        }
    }
}

/// Entry point for moderation commands.
pub struct Infractions {
    pub(crate) store: Arc<dyn InfractionStore>,
    pub(crate) suppressions: Arc<dyn SuppressionRegistry>,
    pub(crate) scheduler: Arc<dyn ExpiryScheduler>,
    pub(crate) config: InfractionConfig,
}

impl Infractions {
    pub fn new(
        store: Arc<dyn InfractionStore>,
        suppressions: Arc<dyn SuppressionRegistry>,
        scheduler: Arc<dyn ExpiryScheduler>,
        config: InfractionConfig,
    ) -> Self {
        Self {
            store,
            suppressions,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &InfractionConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn InfractionStore {
        self.store.as_ref()
    }

    /// Ban `member`, purging `ban_purge_days` of their messages.
    pub async fn apply_ban(
        &self,
        ctx: &dyn CommandContext,
        member: &Member,
        reason: Option<&str>,
        extras: InfractionExtras,
    ) -> Result<ApplyOutcome> {
        let action = InfractionAction::Ban {
            delete_message_days: self.config.ban_purge_days,
        };
        self.apply(ctx, member, action, reason, extras).await
    }

    /// Kick `member`. Kicks are recorded inactive.
    pub async fn apply_kick(
        &self,
        ctx: &dyn CommandContext,
        member: &Member,
        reason: Option<&str>,
        extras: InfractionExtras,
    ) -> Result<ApplyOutcome> {
        self.apply(ctx, member, InfractionAction::Kick, reason, extras)
            .await
    }

    /// Remove `member`'s voice-verified role. Requires them to hold it.
    pub async fn apply_voice_ban(
        &self,
        ctx: &dyn CommandContext,
        member: &Member,
        reason: Option<&str>,
        extras: InfractionExtras,
    ) -> Result<ApplyOutcome> {
        self.apply(ctx, member, InfractionAction::VoiceBan, reason, extras)
            .await
    }

    async fn apply(
        &self,
        ctx: &dyn CommandContext,
        member: &Member,
        action: InfractionAction,
        reason: Option<&str>,
        extras: InfractionExtras,
    ) -> Result<ApplyOutcome> {
        let span = obs::infraction_span(action.kind(), member.id);
        self.apply_steps(ctx, member, action, reason, extras)
            .instrument(span)
            .await
    }

    async fn apply_steps(
        &self,
        ctx: &dyn CommandContext,
        member: &Member,
        action: InfractionAction,
        reason: Option<&str>,
        extras: InfractionExtras,
    ) -> Result<ApplyOutcome> {
        let kind = action.kind();
        let reason = reason::normalize_opt(reason);

        if let Precondition::Unmet { notice } = action.precondition(member, &self.config) {
            obs::emit_precondition_failed(kind, member.id, &notice);
            METRICS.inc_preconditions_failed();
            ctx.send(&notice).await?;
            return Ok(ApplyOutcome::PreconditionFailed);
        }

        if let Some(existing) =
            get_active_infraction(ctx, self.store.as_ref(), member.id, kind, true).await?
        {
            return Ok(ApplyOutcome::AlreadyActive(existing));
        }

        let Some(infraction) = post_infraction(
            ctx,
            self.store.as_ref(),
            member.id,
            kind,
            reason,
            kind.is_persistent(),
            extras,
        )
        .await
        else {
            return Ok(ApplyOutcome::RecordFailed);
        };

        let applied = self.apply_infraction(ctx, infraction, member, action).await?;
        Ok(ApplyOutcome::Applied(applied))
    }
}
