//! Action executor: per-kind precondition and platform action.
//!
//! One [`InfractionAction`] variant per infraction kind. The generic apply
//! routine in [`crate::workflow`] asks it three things: may this member be
//! targeted, which mod-log events will the action cause, and what is the
//! action itself.

use futures::FutureExt;

use infraction_state::{InfractionKind, UserId};

use crate::config::InfractionConfig;
use crate::modlog::LogEvent;
use crate::platform::{Guild, Member, PendingAction};

/// Result of a kind's precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    Met,
    /// The apply must stop; `notice` goes back to the moderator.
    Unmet { notice: String },
}

/// Platform action applied for one infraction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfractionAction {
    Ban { delete_message_days: u8 },
    Kick,
    VoiceBan,
}

impl InfractionAction {
    pub fn kind(&self) -> InfractionKind {
        match self {
            InfractionAction::Ban { .. } => InfractionKind::Ban,
            InfractionAction::Kick => InfractionKind::Kick,
            InfractionAction::VoiceBan => InfractionKind::VoiceBan,
        }
    }

    /// Mod-log events the platform will emit because of this action.
    pub fn caused_events(&self) -> &'static [LogEvent] {
        match self {
            InfractionAction::Ban { .. } => &[LogEvent::MemberBan, LogEvent::MemberRemove],
            InfractionAction::Kick => &[LogEvent::MemberRemove],
            InfractionAction::VoiceBan => &[LogEvent::MemberUpdate],
        }
    }

    /// Checked before the guard; an unmet precondition touches nothing.
    pub fn precondition(&self, member: &Member, config: &InfractionConfig) -> Precondition {
        match self {
            InfractionAction::VoiceBan if !member.has_role(config.voice_verified_role) => {
                Precondition::Unmet {
                    notice: ":x: User doesn't have the Voice Verified role.".to_string(),
                }
            }
            _ => Precondition::Met,
        }
    }

    /// Build the platform call. Nothing happens until the result is awaited.
    pub fn build<'a>(
        &self,
        guild: &'a dyn Guild,
        user_id: UserId,
        reason: Option<String>,
        config: &InfractionConfig,
    ) -> PendingAction<'a> {
        match *self {
            InfractionAction::Ban {
                delete_message_days,
            } => async move {
                guild
                    .ban(user_id, reason.as_deref(), delete_message_days)
                    .await
            }
            .boxed(),
            InfractionAction::Kick => {
                async move { guild.kick(user_id, reason.as_deref()).await }.boxed()
            }
            InfractionAction::VoiceBan => {
                let role = config.voice_verified_role;
                async move { guild.remove_role(user_id, role, reason.as_deref()).await }.boxed()
            }
        }
    }

    /// Past-tense verb used in member notifications.
    pub fn verb(&self) -> &'static str {
        match self {
            InfractionAction::Ban { .. } => "banned",
            InfractionAction::Kick => "kicked",
            InfractionAction::VoiceBan => "voice banned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGuild, GuildCall};
    use crate::platform::{ActionKind, RoleId};

    fn config() -> InfractionConfig {
        InfractionConfig::new(RoleId(123456))
    }

    #[test]
    fn voice_ban_requires_voice_verified_role() {
        let without = Member::new(UserId(1), "a").with_role(RoleId(987));
        let with = Member::new(UserId(1), "a").with_role(RoleId(123456));

        assert!(matches!(
            InfractionAction::VoiceBan.precondition(&without, &config()),
            Precondition::Unmet { .. }
        ));
        assert_eq!(
            InfractionAction::VoiceBan.precondition(&with, &config()),
            Precondition::Met
        );
    }

    #[test]
    fn ban_and_kick_have_no_precondition() {
        let member = Member::new(UserId(1), "a");
        let ban = InfractionAction::Ban {
            delete_message_days: 0,
        };
        assert_eq!(ban.precondition(&member, &config()), Precondition::Met);
        assert_eq!(
            InfractionAction::Kick.precondition(&member, &config()),
            Precondition::Met
        );
    }

    #[test]
    fn voice_ban_suppresses_member_update_only() {
        assert_eq!(
            InfractionAction::VoiceBan.caused_events(),
            &[LogEvent::MemberUpdate]
        );
        assert_eq!(InfractionAction::Kick.caused_events(), &[LogEvent::MemberRemove]);
    }

    #[tokio::test]
    async fn built_action_is_lazy() {
        let guild = FakeGuild::new();
        guild.add_member(Member::new(UserId(1), "a"));

        let pending = InfractionAction::Kick.build(&guild, UserId(1), None, &config());
        assert!(guild.calls().is_empty());

        let outcome = pending.await.unwrap();
        assert_eq!(outcome.action, ActionKind::Kick);
        assert_eq!(
            guild.calls(),
            vec![GuildCall::Kick {
                user_id: UserId(1),
                reason: None
            }]
        );
    }

    #[tokio::test]
    async fn voice_ban_removes_configured_role() {
        let guild = FakeGuild::new();
        guild.add_member(Member::new(UserId(1), "a").with_role(RoleId(123456)));

        InfractionAction::VoiceBan
            .build(&guild, UserId(1), Some("mic spam".to_string()), &config())
            .await
            .unwrap();

        assert_eq!(
            guild.calls(),
            vec![GuildCall::RemoveRole {
                user_id: UserId(1),
                role: RoleId(123456),
                reason: Some("mic spam".to_string()),
            }]
        );
        assert!(!guild.member_snapshot(UserId(1)).unwrap().has_role(RoleId(123456)));
    }
}
