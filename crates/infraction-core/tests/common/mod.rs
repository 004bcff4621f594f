#![allow(dead_code)]

use std::sync::Arc;

use infraction_core::fakes::{
    FakeGuild, MemoryExpiryScheduler, RecordingContext, RecordingSuppressions,
};
use infraction_core::{InfractionConfig, Infractions, Member, RoleId, UserId};
use infraction_state::fakes::MemoryInfractionStore;

pub const MODERATOR: UserId = UserId(1234);
pub const TARGET: UserId = UserId(1265);
pub const VOICE_VERIFIED: RoleId = RoleId(764802720779337729);

/// Everything an apply or pardon touches, backed by fakes.
pub struct Harness {
    pub guild: Arc<FakeGuild>,
    pub ctx: RecordingContext,
    pub store: Arc<MemoryInfractionStore>,
    pub suppressions: Arc<RecordingSuppressions>,
    pub scheduler: Arc<MemoryExpiryScheduler>,
    pub infractions: Infractions,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(InfractionConfig::new(VOICE_VERIFIED))
    }

    pub fn with_config(config: InfractionConfig) -> Self {
        let guild = Arc::new(FakeGuild::new());
        let ctx = RecordingContext::new(MODERATOR, guild.clone());
        let store = Arc::new(MemoryInfractionStore::new());
        let suppressions = Arc::new(RecordingSuppressions::new());
        let scheduler = Arc::new(MemoryExpiryScheduler::new());
        let infractions = Infractions::new(
            store.clone(),
            suppressions.clone(),
            scheduler.clone(),
            config,
        );
        Self {
            guild,
            ctx,
            store,
            suppressions,
            scheduler,
            infractions,
        }
    }

    /// Add the target to the guild, holding the voice-verified role.
    pub fn verified_target(&self) -> Member {
        let member = Member::new(TARGET, "target").with_role(VOICE_VERIFIED);
        self.guild.add_member(member.clone());
        member
    }

    /// Add the target to the guild without any role.
    pub fn plain_target(&self) -> Member {
        let member = Member::new(TARGET, "target");
        self.guild.add_member(member.clone());
        member
    }
}

/// `"foo bar" * 3000`, far past the reason limit.
pub fn long_reason() -> String {
    "foo bar".repeat(3000)
}

pub fn truncated_long_reason() -> String {
    let long = long_reason();
    format!("{}...", &long[..509])
}
