//! Pardon coordinator and expiry hook.
//!
//! Both reverse an active infraction's effect on the platform and mark the
//! record inactive. A failed reversal is reported but never blocks the
//! deactivation.

use std::fmt;

use tracing::Instrument;

use infraction_state::{Infraction, InfractionId, InfractionKind, UserId};

use crate::context::CommandContext;
use crate::error::{PlatformError, Result};
use crate::metrics::METRICS;
use crate::modlog::LogEvent;
use crate::obs;
use crate::platform::Guild;
use crate::workflow::Infractions;

/// What happened on the platform when an infraction was lifted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reversal {
    /// The ban was lifted or the role restored.
    Applied,
    /// The platform had already lifted the ban.
    AlreadyReversed,
    /// The member left the guild; there is no role to restore.
    MemberAbsent,
    /// The kind has no lasting effect to reverse.
    NotApplicable,
    /// The platform rejected the reversal.
    Failed(String),
}

impl Reversal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reversal::Applied => "applied",
            Reversal::AlreadyReversed => "already_reversed",
            Reversal::MemberAbsent => "member_absent",
            Reversal::NotApplicable => "not_applicable",
            Reversal::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Reversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`Infractions::pardon_infraction`] and
/// [`Infractions::expire_infraction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PardonOutcome {
    /// The record is now inactive.
    Pardoned {
        infraction: Infraction,
        reversal: Reversal,
    },
    /// No active infraction; nothing was touched.
    NothingActive,
}

impl Infractions {
    /// Lift the active infraction of `kind` for `user_id`.
    ///
    /// Idempotent: with nothing active the moderator is told so and
    /// `PardonOutcome::NothingActive` is returned.
    pub async fn pardon_infraction(
        &self,
        ctx: &dyn CommandContext,
        kind: InfractionKind,
        user_id: UserId,
    ) -> Result<PardonOutcome> {
        self.pardon_steps(ctx, kind, user_id)
            .instrument(obs::infraction_span(kind, user_id))
            .await
    }

    async fn pardon_steps(
        &self,
        ctx: &dyn CommandContext,
        kind: InfractionKind,
        user_id: UserId,
    ) -> Result<PardonOutcome> {
        let Some(active) = self.store.active(user_id, kind).await? else {
            obs::emit_pardon_noop(kind, user_id);
            ctx.send(&format!(
                ":x: There's no active {kind} infraction for user <@{user_id}>."
            ))
            .await?;
            return Ok(PardonOutcome::NothingActive);
        };

        let reason = format!("Pardoned by {}", ctx.actor());
        let (infraction, reversal) = self.lift(ctx.guild(), active, &reason).await?;

        let mut confirmation = format!(
            ":ok_hand: pardoned infraction **{}** for <@{}>.",
            infraction.kind, infraction.user_id
        );
        match &reversal {
            Reversal::Failed(err) => {
                confirmation.push_str(&format!(" The reversal failed: {err}"));
            }
            Reversal::MemberAbsent => {
                confirmation.push_str(" The user is no longer in the server.");
            }
            _ => {}
        }
        if let Err(err) = ctx.send(&confirmation).await {
            tracing::warn!(error = %err, "could not confirm pardon");
        }

        Ok(PardonOutcome::Pardoned {
            infraction,
            reversal,
        })
    }

    /// Called by the expiry timer once `expires_at` has passed.
    ///
    /// An already inactive record (pardoned in the meantime) is left alone.
    pub async fn expire_infraction(
        &self,
        guild: &dyn Guild,
        id: &InfractionId,
    ) -> Result<PardonOutcome> {
        let record = self.store.get(id).await?;
        let span = obs::infraction_span(record.kind, record.user_id);

        if !record.active {
            span.in_scope(|| obs::emit_pardon_noop(record.kind, record.user_id));
            return Ok(PardonOutcome::NothingActive);
        }

        let (infraction, reversal) = self
            .lift(guild, record, "Infraction expired")
            .instrument(span)
            .await?;
        Ok(PardonOutcome::Pardoned {
            infraction,
            reversal,
        })
    }

    async fn lift(
        &self,
        guild: &dyn Guild,
        infraction: Infraction,
        reason: &str,
    ) -> Result<(Infraction, Reversal)> {
        let reversal = self.reverse(guild, &infraction, reason).await;
        if let Reversal::Failed(err) = &reversal {
            obs::emit_reversal_failed(&infraction.id, infraction.kind, err);
        }

        let updated = self.store.deactivate(&infraction.id).await?;
        self.scheduler.cancel(&updated.id);

        obs::emit_pardoned(&updated.id, updated.kind, updated.user_id, reversal.as_str());
        METRICS.inc_pardons();

        Ok((updated, reversal))
    }

    async fn reverse(&self, guild: &dyn Guild, infraction: &Infraction, reason: &str) -> Reversal {
        let user_id = infraction.user_id;
        match infraction.kind {
            InfractionKind::Ban => {
                self.suppressions.ignore(LogEvent::MemberUnban, user_id);
                match guild.unban(user_id, Some(reason)).await {
                    Ok(_) => Reversal::Applied,
                    Err(err) => {
                        self.suppressions.withdraw(LogEvent::MemberUnban, user_id);
                        match err {
                            PlatformError::NotFound(_) => Reversal::AlreadyReversed,
                            other => Reversal::Failed(other.to_string()),
                        }
                    }
                }
            }
            InfractionKind::VoiceBan => {
                match guild.member(user_id).await {
                    Ok(Some(_)) => {}
                    Ok(None) => return Reversal::MemberAbsent,
                    Err(err) => return Reversal::Failed(err.to_string()),
                }
                let role = self.config.voice_verified_role;
                self.suppressions.ignore(LogEvent::MemberUpdate, user_id);
                match guild.add_role(user_id, role, Some(reason)).await {
                    Ok(_) => Reversal::Applied,
                    Err(err) => {
                        self.suppressions.withdraw(LogEvent::MemberUpdate, user_id);
                        Reversal::Failed(err.to_string())
                    }
                }
            }
            InfractionKind::Kick => Reversal::NotApplicable,
        }
    }
}
