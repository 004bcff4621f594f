//! Infraction Core Library
//!
//! Turns a moderator's ban, kick or voice-ban into a stored infraction plus
//! the matching platform action, and reverses them on pardon or expiry.

pub mod action;
pub mod config;
pub mod context;
mod coordinator;
pub mod error;
pub mod fakes;
pub mod guard;
pub mod metrics;
pub mod modlog;
pub mod obs;
pub mod pardon;
pub mod platform;
pub mod reason;
pub mod recorder;
pub mod scheduler;
pub mod telemetry;
pub mod workflow;

pub use action::{InfractionAction, Precondition};
pub use config::InfractionConfig;
pub use context::CommandContext;
pub use error::{ConfigError, InfractionError, PlatformError, PlatformResult, Result};
pub use guard::get_active_infraction;
pub use metrics::METRICS;
pub use modlog::{LogEvent, ModLog, SuppressionRegistry};
pub use obs::{
    emit_action_failed, emit_duplicate_blocked, emit_infraction_applied, emit_pardoned,
    emit_record_failed, emit_suppression_armed, infraction_span, InfractionSpan,
};
pub use pardon::{PardonOutcome, Reversal};
pub use platform::{ActionKind, ActionOutcome, Guild, Member, PendingAction, RoleId};
pub use reason::{normalize, normalize_opt, REASON_MAX_CHARS};
pub use recorder::post_infraction;
pub use scheduler::ExpiryScheduler;
pub use telemetry::init_tracing;
pub use workflow::{ApplyOutcome, Infractions};

pub use infraction_state::{
    Infraction, InfractionExtras, InfractionId, InfractionKind, InfractionStore, StorageError,
    UserId,
};
