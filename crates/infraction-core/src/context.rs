//! Invocation context of a moderation command.

use async_trait::async_trait;

use infraction_state::UserId;

use crate::error::PlatformResult;
use crate::platform::Guild;

/// What a command invocation gives the workflow: who invoked it, in which
/// guild, and a channel to answer in.
#[async_trait]
pub trait CommandContext: Send + Sync {
    /// The moderator who invoked the command.
    fn actor(&self) -> UserId;

    /// The guild the command was invoked in.
    fn guild(&self) -> &dyn Guild;

    /// Reply in the invoking channel.
    async fn send(&self, content: &str) -> PlatformResult<()>;
}
