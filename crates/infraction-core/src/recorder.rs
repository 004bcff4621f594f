//! Infraction recorder: posts a new infraction to the store.

use infraction_state::{
    Infraction, InfractionExtras, InfractionKind, InfractionStore, NewInfraction, StorageError,
    UserId,
};

use crate::context::CommandContext;
use crate::metrics::METRICS;
use crate::obs;

/// Persist an infraction issued by the context's actor.
///
/// Returns `None` when the store refuses or fails; the context has then been
/// told, and the caller must not run the action. A lost race against a
/// concurrent apply surfaces here as `StorageError::DuplicateActive`.
pub async fn post_infraction(
    ctx: &dyn CommandContext,
    store: &dyn InfractionStore,
    user_id: UserId,
    kind: InfractionKind,
    reason: Option<String>,
    active: bool,
    extras: InfractionExtras,
) -> Option<Infraction> {
    let draft = NewInfraction {
        user_id,
        actor_id: ctx.actor(),
        kind,
        reason,
        active,
        extras,
    };

    match store.post(draft).await {
        Ok(record) => Some(record),
        Err(err) => {
            obs::emit_record_failed(kind, user_id, &err);
            METRICS.inc_record_failures();

            let notice = match &err {
                StorageError::DuplicateActive { .. } => format!(
                    ":x: According to my records, this user already has a {kind} infraction."
                ),
                other => format!(":x: There was an error adding the infraction: {other}"),
            };
            if let Err(send_err) = ctx.send(&notice).await {
                tracing::warn!(error = %send_err, "could not report recorder failure");
            }
            None
        }
    }
}
