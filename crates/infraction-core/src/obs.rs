//! Structured observability hooks for the infraction workflow.
//!
//! Every step of apply and pardon emits one `event = "infraction.*"` line.
//! These lines double as the mod-log record of what the workflow did; for
//! JSON output initialise tracing with [`crate::init_tracing`]`(true, ..)`.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use infraction_state::{InfractionId, InfractionKind, UserId};

use crate::modlog::LogEvent;

/// Span covering one command invocation. Attach it to async work with
/// `tracing::Instrument::instrument`.
pub fn infraction_span(kind: InfractionKind, user_id: UserId) -> tracing::Span {
    tracing::info_span!("infraction", kind = %kind, user_id = %user_id)
}

/// RAII guard that enters [`infraction_span`] for synchronous code.
///
/// ```ignore
/// let _span = InfractionSpan::enter(InfractionKind::Ban, user_id);
/// ```
pub struct InfractionSpan {
    _span: tracing::span::EnteredSpan,
}

impl InfractionSpan {
    pub fn enter(kind: InfractionKind, user_id: UserId) -> Self {
        Self {
            _span: infraction_span(kind, user_id).entered(),
        }
    }
}

pub fn emit_precondition_failed(kind: InfractionKind, user_id: UserId, reason: &str) {
    info!(event = "infraction.precondition_failed", kind = %kind, user_id = %user_id, reason = %reason);
}

pub fn emit_duplicate_blocked(kind: InfractionKind, user_id: UserId, existing: &InfractionId) {
    info!(
        event = "infraction.duplicate_blocked",
        kind = %kind,
        user_id = %user_id,
        existing_id = %existing,
    );
}

/// Recorder could not persist the infraction; nothing else ran.
pub fn emit_record_failed(kind: InfractionKind, user_id: UserId, error: &dyn std::fmt::Display) {
    warn!(event = "infraction.record_failed", kind = %kind, user_id = %user_id, error = %error);
}

pub fn emit_suppression_armed(event: LogEvent, user_id: UserId) {
    tracing::debug!(event = "infraction.suppression_armed", log_event = %event, user_id = %user_id);
}

pub fn emit_dm_failed(user_id: UserId, error: &dyn std::fmt::Display) {
    info!(event = "infraction.dm_failed", user_id = %user_id, error = %error);
}

/// Platform rejected the action; the record with `id` is still stored.
pub fn emit_action_failed(
    id: &InfractionId,
    kind: InfractionKind,
    user_id: UserId,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "infraction.action_failed",
        infraction_id = %id,
        kind = %kind,
        user_id = %user_id,
        error = %error,
    );
}

pub fn emit_infraction_applied(
    id: &InfractionId,
    kind: InfractionKind,
    user_id: UserId,
    actor_id: UserId,
    dm_sent: bool,
    expires_at: Option<DateTime<Utc>>,
) {
    info!(
        event = "infraction.applied",
        infraction_id = %id,
        kind = %kind,
        user_id = %user_id,
        actor_id = %actor_id,
        dm_sent = dm_sent,
        expires_at = ?expires_at,
    );
}

pub fn emit_pardon_noop(kind: InfractionKind, user_id: UserId) {
    info!(event = "infraction.pardon_noop", kind = %kind, user_id = %user_id);
}

pub fn emit_pardoned(id: &InfractionId, kind: InfractionKind, user_id: UserId, reversal: &str) {
    info!(
        event = "infraction.pardoned",
        infraction_id = %id,
        kind = %kind,
        user_id = %user_id,
        reversal = %reversal,
    );
}

pub fn emit_reversal_failed(id: &InfractionId, kind: InfractionKind, error: &dyn std::fmt::Display) {
    warn!(event = "infraction.reversal_failed", infraction_id = %id, kind = %kind, error = %error);
}
