//! Mod-log suppression windows.
//!
//! Moderator-caused platform events (the ban a command just issued, the role
//! it just removed) are already reported by the workflow. Before running an
//! action the workflow arms a window for each event the action will cause;
//! the mod-log listener calls [`ModLog::should_skip`] and drops the first
//! matching event. Unconsumed windows lapse after a TTL.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

use infraction_state::UserId;

/// Platform events the mod-log listener reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    MemberBan,
    MemberRemove,
    MemberUnban,
    MemberUpdate,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogEvent::MemberBan => "member_ban",
            LogEvent::MemberRemove => "member_remove",
            LogEvent::MemberUnban => "member_unban",
            LogEvent::MemberUpdate => "member_update",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the workflow arms suppression windows.
pub trait SuppressionRegistry: Send + Sync {
    /// Suppress the next `event` concerning `user_id`.
    fn ignore(&self, event: LogEvent, user_id: UserId);

    /// Drop one window armed for an action that never happened.
    fn withdraw(&self, event: LogEvent, user_id: UserId);
}

/// In-process suppression registry shared with the mod-log listener.
#[derive(Debug)]
pub struct ModLog {
    ttl: Duration,
    windows: Mutex<HashMap<(LogEvent, UserId), Vec<Instant>>>,
}

impl ModLog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Called by the listener for every observed event. Returns `true` (and
    /// consumes the window) when the event was caused by the workflow.
    pub fn should_skip(&self, event: LogEvent, user_id: UserId) -> bool {
        let now = Instant::now();
        let mut windows = self.lock();
        let Some(deadlines) = windows.get_mut(&(event, user_id)) else {
            return false;
        };

        deadlines.retain(|deadline| *deadline > now);
        let skipped = if deadlines.is_empty() {
            false
        } else {
            deadlines.remove(0);
            true
        };
        if deadlines.is_empty() {
            windows.remove(&(event, user_id));
        }

        trace!(event = %event, user_id = %user_id, skipped, "mod-log event checked");
        skipped
    }

    /// Unexpired windows for `(event, user_id)`.
    pub fn pending(&self, event: LogEvent, user_id: UserId) -> usize {
        let now = Instant::now();
        self.lock()
            .get(&(event, user_id))
            .map(|deadlines| deadlines.iter().filter(|d| **d > now).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(LogEvent, UserId), Vec<Instant>>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SuppressionRegistry for ModLog {
    fn ignore(&self, event: LogEvent, user_id: UserId) {
        let deadline = Instant::now() + self.ttl;
        self.lock()
            .entry((event, user_id))
            .or_default()
            .push(deadline);
    }

    fn withdraw(&self, event: LogEvent, user_id: UserId) {
        let mut windows = self.lock();
        if let Some(deadlines) = windows.get_mut(&(event, user_id)) {
            // Newest window belongs to the failed action.
            deadlines.pop();
            if deadlines.is_empty() {
                windows.remove(&(event, user_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(1265);

    #[tokio::test]
    async fn window_is_consumed_once() {
        let log = ModLog::new(Duration::from_secs(30));
        log.ignore(LogEvent::MemberUpdate, USER);

        assert!(log.should_skip(LogEvent::MemberUpdate, USER));
        assert!(!log.should_skip(LogEvent::MemberUpdate, USER));
    }

    #[tokio::test]
    async fn window_is_keyed_by_event_and_user() {
        let log = ModLog::new(Duration::from_secs(30));
        log.ignore(LogEvent::MemberRemove, USER);

        assert!(!log.should_skip(LogEvent::MemberBan, USER));
        assert!(!log.should_skip(LogEvent::MemberRemove, UserId(42)));
        assert!(log.should_skip(LogEvent::MemberRemove, USER));
    }

    #[tokio::test(start_paused = true)]
    async fn window_expires_after_ttl() {
        let log = ModLog::new(Duration::from_secs(30));
        log.ignore(LogEvent::MemberBan, USER);
        assert_eq!(log.pending(LogEvent::MemberBan, USER), 1);

        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(log.pending(LogEvent::MemberBan, USER), 0);
        assert!(!log.should_skip(LogEvent::MemberBan, USER));
    }

    #[tokio::test]
    async fn stacked_windows_are_counted() {
        let log = ModLog::new(Duration::from_secs(30));
        log.ignore(LogEvent::MemberUpdate, USER);
        log.ignore(LogEvent::MemberUpdate, USER);
        assert_eq!(log.pending(LogEvent::MemberUpdate, USER), 2);

        log.withdraw(LogEvent::MemberUpdate, USER);
        assert_eq!(log.pending(LogEvent::MemberUpdate, USER), 1);
        assert!(log.should_skip(LogEvent::MemberUpdate, USER));
        assert!(!log.should_skip(LogEvent::MemberUpdate, USER));
    }

    #[test]
    fn event_names() {
        assert_eq!(LogEvent::MemberUpdate.to_string(), "member_update");
        assert_eq!(LogEvent::MemberBan.as_str(), "member_ban");
    }
}
