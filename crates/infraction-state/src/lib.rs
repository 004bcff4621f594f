//! Infraction-State: persistence for moderation infractions
//!
//! This crate owns the infraction store consumed by the moderation workflow.
//! The workflow never touches rows directly; it goes through the
//! [`InfractionStore`] trait.
//!
//! ## Key Components
//!
//! - `InfractionStore`: async trait (lookup active, post, deactivate, history)
//! - `MemoryInfractionStore`: in-memory fake with outage injection
//! - `SurrealInfractionStore`: SurrealDB backend whose UNIQUE `active_slot`
//!   index makes "one active infraction per (user, kind)" atomic

pub mod connection;
mod error;
pub mod fakes;
mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use connection::CloudConfig;
pub use error::{StateError, StorageError};
pub use schema::InfractionRow;
pub use storage_traits::{
    Infraction, InfractionExtras, InfractionId, InfractionKind, InfractionStore, NewInfraction,
    StorageResult, UserId,
};
pub use surreal_store::SurrealInfractionStore;

/// Result type for infraction-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
