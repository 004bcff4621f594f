//! Expiry scheduling seam.
//!
//! The timer that fires when a temporary infraction lapses lives outside the
//! workflow. It is handed every applied infraction with an `expires_at`, and
//! calls [`crate::Infractions::expire_infraction`] when the time comes.

use infraction_state::{Infraction, InfractionId};

/// Timer collaborator for temporary infractions.
pub trait ExpiryScheduler: Send + Sync {
    /// Arrange for `infraction` to be expired at its `expires_at`.
    fn schedule(&self, infraction: &Infraction);

    /// Forget a scheduled expiry. No-op when nothing is scheduled.
    fn cancel(&self, id: &InfractionId);
}
