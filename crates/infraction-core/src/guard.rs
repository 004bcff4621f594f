//! Active-infraction guard.

use infraction_state::{Infraction, InfractionKind, InfractionStore, UserId};

use crate::context::CommandContext;
use crate::error::Result;
use crate::metrics::METRICS;
use crate::obs;

/// Return the active infraction of `kind` for `user_id`, if one exists.
///
/// When one exists and `notify` is set, the invoking context is told and the
/// caller must abandon the apply. Store failures propagate.
pub async fn get_active_infraction(
    ctx: &dyn CommandContext,
    store: &dyn InfractionStore,
    user_id: UserId,
    kind: InfractionKind,
    notify: bool,
) -> Result<Option<Infraction>> {
    let Some(active) = store.active(user_id, kind).await? else {
        return Ok(None);
    };

    obs::emit_duplicate_blocked(kind, user_id, &active.id);
    METRICS.inc_duplicates_blocked();

    if notify {
        ctx.send(&format!(
            ":x: According to my records, this user already has a {} infraction. \
             See infraction **#{}**.",
            kind, active.id
        ))
        .await?;
    }

    Ok(Some(active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGuild, RecordingContext};
    use infraction_state::fakes::MemoryInfractionStore;
    use infraction_state::{InfractionExtras, NewInfraction};
    use std::sync::Arc;

    fn ctx() -> RecordingContext {
        RecordingContext::new(UserId(1234), Arc::new(FakeGuild::new()))
    }

    #[tokio::test]
    async fn no_record_means_no_message() {
        let ctx = ctx();
        let store = MemoryInfractionStore::new();

        let found = get_active_infraction(&ctx, &store, UserId(1), InfractionKind::Ban, true)
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(ctx.sent().is_empty());
        assert_eq!(store.active_lookups(), 1);
    }

    #[tokio::test]
    async fn existing_record_is_reported() {
        let ctx = ctx();
        let store = MemoryInfractionStore::new();
        let existing = store
            .post(NewInfraction {
                user_id: UserId(1),
                actor_id: UserId(2),
                kind: InfractionKind::VoiceBan,
                reason: None,
                active: true,
                extras: InfractionExtras::default(),
            })
            .await
            .unwrap();

        let found = get_active_infraction(&ctx, &store, UserId(1), InfractionKind::VoiceBan, true)
            .await
            .unwrap();

        assert_eq!(found, Some(existing.clone()));
        let sent = ctx.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("voice_ban"));
        assert!(sent[0].contains(existing.id.as_str()));
    }

    #[tokio::test]
    async fn silent_lookup_sends_nothing() {
        let ctx = ctx();
        let store = MemoryInfractionStore::new();
        store
            .post(NewInfraction {
                user_id: UserId(1),
                actor_id: UserId(2),
                kind: InfractionKind::Ban,
                reason: None,
                active: true,
                extras: InfractionExtras::default(),
            })
            .await
            .unwrap();

        let found = get_active_infraction(&ctx, &store, UserId(1), InfractionKind::Ban, false)
            .await
            .unwrap();

        assert!(found.is_some());
        assert!(ctx.sent().is_empty());
    }
}
