//! Post-action coordinator.
//!
//! Runs after the recorder has stored the infraction: arms suppression,
//! notifies the member, awaits the platform action, schedules expiry and
//! confirms to the moderator.

use chrono::{DateTime, Utc};

use infraction_state::Infraction;

use crate::action::InfractionAction;
use crate::context::CommandContext;
use crate::error::{InfractionError, PlatformError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::platform::Member;
use crate::workflow::Infractions;

pub(crate) fn format_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn member_notice(infraction: &Infraction, action: InfractionAction) -> String {
    let expires = infraction
        .expires_at
        .map(format_expiry)
        .unwrap_or_else(|| "N/A".to_string());
    let reason = infraction.reason.as_deref().unwrap_or("No reason provided.");
    format!(
        "You have been {}.\nInfraction: {}\nExpires: {}\nReason: {}",
        action.verb(),
        infraction.kind,
        expires,
        reason
    )
}

impl Infractions {
    /// Carry out a recorded infraction.
    ///
    /// The platform action is built here but only awaited once every
    /// suppression window it needs has been armed. On failure the windows
    /// are withdrawn and `InfractionError::ActionFailed` names the record.
    pub async fn apply_infraction(
        &self,
        ctx: &dyn CommandContext,
        infraction: Infraction,
        member: &Member,
        action: InfractionAction,
    ) -> Result<Infraction> {
        let pending = action.build(
            ctx.guild(),
            member.id,
            infraction.reason.clone(),
            &self.config,
        );

        let events = action.caused_events();
        for event in events {
            self.suppressions.ignore(*event, member.id);
            obs::emit_suppression_armed(*event, member.id);
        }

        let dm_sent = if infraction.hidden || !self.config.notify_members {
            false
        } else {
            match ctx
                .guild()
                .send_direct_message(member.id, &member_notice(&infraction, action))
                .await
            {
                Ok(()) => true,
                Err(err) => {
                    obs::emit_dm_failed(member.id, &err);
                    false
                }
            }
        };

        if let Err(source) = pending.await {
            for event in events {
                self.suppressions.withdraw(*event, member.id);
            }
            return Err(self.action_failed(ctx, &infraction, source).await);
        }

        if infraction.expires_at.is_some() {
            self.scheduler.schedule(&infraction);
        }

        let expiry = infraction
            .expires_at
            .map(|at| format!(" until {}", format_expiry(at)))
            .unwrap_or_default();
        let envelope = if dm_sent { ":incoming_envelope: " } else { "" };
        let confirmation = format!(
            "{envelope}:ok_hand: applied **{}** to {}{expiry}.",
            infraction.kind, member.display_name
        );
        if let Err(err) = ctx.send(&confirmation).await {
            tracing::warn!(error = %err, "could not confirm applied infraction");
        }

        obs::emit_infraction_applied(
            &infraction.id,
            infraction.kind,
            infraction.user_id,
            infraction.actor_id,
            dm_sent,
            infraction.expires_at,
        );
        METRICS.inc_applied();

        Ok(infraction)
    }

    async fn action_failed(
        &self,
        ctx: &dyn CommandContext,
        infraction: &Infraction,
        source: PlatformError,
    ) -> InfractionError {
        obs::emit_action_failed(&infraction.id, infraction.kind, infraction.user_id, &source);
        METRICS.inc_action_failures();

        let mut deactivated = false;
        if self.config.deactivate_on_action_failure && infraction.active {
            match self.store.deactivate(&infraction.id).await {
                Ok(_) => deactivated = true,
                Err(err) => {
                    tracing::warn!(
                        infraction_id = %infraction.id,
                        error = %err,
                        "could not deactivate infraction after failed action"
                    );
                }
            }
        }

        let followup = if deactivated {
            "It has been marked inactive."
        } else if infraction.active {
            "It is still active; pardon it before retrying."
        } else {
            "Nothing was changed on the server."
        };
        let notice = format!(
            ":x: Infraction **#{}** was recorded but the {} failed: {}. {}",
            infraction.id, infraction.kind, source, followup
        );
        if let Err(err) = ctx.send(&notice).await {
            tracing::warn!(error = %err, "could not report failed action");
        }

        InfractionError::ActionFailed {
            infraction_id: infraction.id.clone(),
            kind: infraction.kind,
            source,
        }
    }
}
