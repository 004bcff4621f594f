//! Workflow configuration.
//!
//! Loaded from a TOML table or from `INFRACTION_*` environment variables.
//!
//! ```toml
//! voice_verified_role = 764802720779337729
//! ban_purge_days = 0
//! suppression_ttl_secs = 30
//! notify_members = true
//! deactivate_on_action_failure = false
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::RoleId;

fn default_suppression_ttl_secs() -> u64 {
    30
}

fn default_notify_members() -> bool {
    true
}

/// Settings for [`crate::Infractions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionConfig {
    /// Role a member must hold to be voice-banned; removed by the voice ban.
    pub voice_verified_role: RoleId,

    /// Days of message history deleted by a ban.
    #[serde(default)]
    pub ban_purge_days: u8,

    /// How long an unconsumed mod-log suppression window stays armed.
    #[serde(default = "default_suppression_ttl_secs")]
    pub suppression_ttl_secs: u64,

    /// DM members about infractions applied to them (hidden ones excepted).
    #[serde(default = "default_notify_members")]
    pub notify_members: bool,

    /// Mark the record inactive when the platform rejects the action.
    /// Off by default: the record stays active and the moderator is told
    /// which infraction to pardon.
    #[serde(default)]
    pub deactivate_on_action_failure: bool,
}

impl InfractionConfig {
    pub fn new(voice_verified_role: RoleId) -> Self {
        Self {
            voice_verified_role,
            ban_purge_days: 0,
            suppression_ttl_secs: default_suppression_ttl_secs(),
            notify_members: default_notify_members(),
            deactivate_on_action_failure: false,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - INFRACTION_VOICE_VERIFIED_ROLE (required)
    /// - INFRACTION_BAN_PURGE_DAYS (optional, default: 0)
    /// - INFRACTION_SUPPRESSION_TTL_SECS (optional, default: 30)
    /// - INFRACTION_NOTIFY_MEMBERS (optional, default: true)
    /// - INFRACTION_DEACTIVATE_ON_ACTION_FAILURE (optional, default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let role: u64 = required_var("INFRACTION_VOICE_VERIFIED_ROLE")?;
        let mut config = Self::new(RoleId(role));

        if let Some(days) = optional_var("INFRACTION_BAN_PURGE_DAYS")? {
            config.ban_purge_days = days;
        }
        if let Some(ttl) = optional_var("INFRACTION_SUPPRESSION_TTL_SECS")? {
            config.suppression_ttl_secs = ttl;
        }
        if let Some(notify) = optional_var("INFRACTION_NOTIFY_MEMBERS")? {
            config.notify_members = notify;
        }
        if let Some(deactivate) = optional_var("INFRACTION_DEACTIVATE_ON_ACTION_FAILURE")? {
            config.deactivate_on_action_failure = deactivate;
        }
        Ok(config)
    }

    pub fn suppression_ttl(&self) -> Duration {
        Duration::from_secs(self.suppression_ttl_secs)
    }
}

fn parse_var<T: FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name: name.to_string(),
        value,
    })
}

fn required_var<T: FromStr>(name: &str) -> Result<T, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))?;
    parse_var(name, value)
}

fn optional_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => parse_var(name, value).map(Some),
        Err(_) => Ok(None),
    }
}
