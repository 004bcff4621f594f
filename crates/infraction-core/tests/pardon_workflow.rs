//! Pardon and expiry flows.

mod common;

use chrono::{TimeZone, Utc};

use common::{Harness, MODERATOR, TARGET, VOICE_VERIFIED};
use infraction_core::fakes::GuildCall;
use infraction_core::{
    ActionKind, InfractionError, InfractionExtras, InfractionId, InfractionKind, InfractionStore,
    LogEvent, PardonOutcome, PlatformError, Reversal, StorageError,
};
use infraction_state::{Infraction, NewInfraction};

async fn seed(h: &Harness, kind: InfractionKind) -> Infraction {
    h.store
        .post(NewInfraction {
            user_id: TARGET,
            actor_id: MODERATOR,
            kind,
            reason: Some("seeded".to_string()),
            active: true,
            extras: InfractionExtras::default(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn pardon_without_active_record_is_a_noop() {
    let h = Harness::new();

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::VoiceBan, TARGET)
        .await
        .unwrap();

    assert_eq!(outcome, PardonOutcome::NothingActive);
    assert!(h.guild.calls().is_empty());
    assert_eq!(h.store.deactivations(), 0);
    assert!(h.suppressions.ignored().is_empty());
    let sent = h.ctx.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("no active voice_ban infraction"));
}

#[tokio::test]
async fn pardoning_twice_is_idempotent() {
    let h = Harness::new();
    let member = h.plain_target();
    h.infractions
        .apply_ban(&h.ctx, &member, None, InfractionExtras::default())
        .await
        .unwrap();

    let first = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();
    let second = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();

    assert!(matches!(first, PardonOutcome::Pardoned { .. }));
    assert_eq!(second, PardonOutcome::NothingActive);
    let unbans = h
        .guild
        .actions()
        .into_iter()
        .filter(|c| matches!(c, GuildCall::Unban { .. }))
        .count();
    assert_eq!(unbans, 1);
}

#[tokio::test]
async fn pardon_ban_unbans_and_deactivates() {
    let h = Harness::new();
    let member = h.plain_target();
    let applied = h
        .infractions
        .apply_ban(&h.ctx, &member, Some("raid"), InfractionExtras::default())
        .await
        .unwrap();
    let id = applied.applied().unwrap().id.clone();

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();

    let PardonOutcome::Pardoned {
        infraction,
        reversal,
    } = outcome
    else {
        panic!("expected a pardon");
    };
    assert_eq!(infraction.id, id);
    assert!(!infraction.active);
    assert_eq!(reversal, Reversal::Applied);
    assert!(!h.guild.is_banned(TARGET));
    assert!(h
        .suppressions
        .ignored()
        .contains(&(LogEvent::MemberUnban, TARGET)));
    assert!(h
        .store
        .active(TARGET, InfractionKind::Ban)
        .await
        .unwrap()
        .is_none());
    assert!(h.ctx.sent().last().unwrap().starts_with(":ok_hand: pardoned"));
}

#[tokio::test]
async fn ban_lifted_elsewhere_counts_as_reversed() {
    let h = Harness::new();
    seed(&h, InfractionKind::Ban).await;

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        PardonOutcome::Pardoned {
            reversal: Reversal::AlreadyReversed,
            ..
        }
    ));
    assert_eq!(
        h.suppressions.withdrawn(),
        vec![(LogEvent::MemberUnban, TARGET)]
    );
}

#[tokio::test]
async fn failed_reversal_still_deactivates() {
    let h = Harness::new();
    let seeded = seed(&h, InfractionKind::Ban).await;
    h.guild.add_ban(TARGET);
    h.guild
        .fail(ActionKind::Unban, PlatformError::Http("500".to_string()));

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        PardonOutcome::Pardoned {
            reversal: Reversal::Failed(_),
            ..
        }
    ));
    assert!(!h.store.get(&seeded.id).await.unwrap().active);
    assert!(h.guild.is_banned(TARGET));
    assert!(h.ctx.sent().last().unwrap().contains("reversal failed"));
}

#[tokio::test]
async fn pardon_voice_ban_restores_role() {
    let h = Harness::new();
    let member = h.verified_target();
    h.infractions
        .apply_voice_ban(&h.ctx, &member, Some("mic spam"), InfractionExtras::default())
        .await
        .unwrap();

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::VoiceBan, TARGET)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        PardonOutcome::Pardoned {
            reversal: Reversal::Applied,
            ..
        }
    ));
    assert!(h
        .guild
        .member_snapshot(TARGET)
        .unwrap()
        .has_role(VOICE_VERIFIED));
    let update_windows = h
        .suppressions
        .ignored()
        .into_iter()
        .filter(|w| *w == (LogEvent::MemberUpdate, TARGET))
        .count();
    assert_eq!(update_windows, 2);
}

#[tokio::test]
async fn pardon_voice_ban_for_departed_member() {
    let h = Harness::new();
    let seeded = seed(&h, InfractionKind::VoiceBan).await;

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::VoiceBan, TARGET)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        PardonOutcome::Pardoned {
            reversal: Reversal::MemberAbsent,
            ..
        }
    ));
    assert!(h.guild.actions().is_empty());
    assert!(h.suppressions.ignored().is_empty());
    assert!(!h.store.get(&seeded.id).await.unwrap().active);
}

#[tokio::test]
async fn pardon_cancels_scheduled_expiry() {
    let h = Harness::new();
    let member = h.plain_target();
    let expires_at = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
    h.infractions
        .apply_ban(
            &h.ctx,
            &member,
            None,
            InfractionExtras::expiring_at(expires_at),
        )
        .await
        .unwrap();
    assert_eq!(h.scheduler.len(), 1);

    h.infractions
        .pardon_infraction(&h.ctx, InfractionKind::Ban, TARGET)
        .await
        .unwrap();

    assert!(h.scheduler.is_empty());
}

#[tokio::test]
async fn expiry_lifts_temporary_voice_ban_once() {
    let h = Harness::new();
    let member = h.verified_target();
    let expires_at = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
    let applied = h
        .infractions
        .apply_voice_ban(
            &h.ctx,
            &member,
            None,
            InfractionExtras::expiring_at(expires_at),
        )
        .await
        .unwrap();
    let id = applied.applied().unwrap().id.clone();

    let first = h
        .infractions
        .expire_infraction(h.guild.as_ref(), &id)
        .await
        .unwrap();
    let second = h
        .infractions
        .expire_infraction(h.guild.as_ref(), &id)
        .await
        .unwrap();

    assert!(matches!(
        first,
        PardonOutcome::Pardoned {
            reversal: Reversal::Applied,
            ..
        }
    ));
    assert_eq!(second, PardonOutcome::NothingActive);
    assert!(h.scheduler.is_empty());
    assert!(h
        .guild
        .member_snapshot(TARGET)
        .unwrap()
        .has_role(VOICE_VERIFIED));
    assert!(matches!(
        h.guild.actions().last(),
        Some(GuildCall::AddRole {
            reason: Some(reason),
            ..
        }) if reason == "Infraction expired"
    ));
}

#[tokio::test]
async fn expiring_unknown_infraction_is_an_error() {
    let h = Harness::new();

    let err = h
        .infractions
        .expire_infraction(h.guild.as_ref(), &InfractionId("missing".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InfractionError::Storage(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn kick_history_is_kept_and_never_pardoned() {
    let h = Harness::new();
    let member = h.plain_target();
    h.infractions
        .apply_kick(&h.ctx, &member, Some("spam"), InfractionExtras::default())
        .await
        .unwrap();

    let outcome = h
        .infractions
        .pardon_infraction(&h.ctx, InfractionKind::Kick, TARGET)
        .await
        .unwrap();

    assert_eq!(outcome, PardonOutcome::NothingActive);
    let history = h.store.history(TARGET).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, InfractionKind::Kick);
}
