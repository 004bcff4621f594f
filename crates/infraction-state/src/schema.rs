//! Row definitions for the SurrealDB `infractions` table
//!
//! The row mirrors [`crate::Infraction`] plus one derived column,
//! `active_slot`, which carries the uniqueness constraint for active
//! infractions (see `migrations::init_infractions_table`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{Infraction, InfractionId, StorageResult, UserId};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde::Serialize::serialize(&SurrealDatetime::from(*date), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(DateTime::from(SurrealDatetime::deserialize(deserializer)?))
    }
}

/// Optional variant of [`surreal_datetime`]
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = date.map(SurrealDatetime::from);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Value of `active_slot` while an infraction is in force.
///
/// Two active infractions of the same kind for the same user would share this
/// value, which the UNIQUE index rejects.
pub fn held_slot(user_id: UserId, kind: &str) -> String {
    format!("{}:{}", user_id.0, kind)
}

/// Value of `active_slot` once an infraction is inactive. Unique per record.
pub fn released_slot(id: &InfractionId) -> String {
    format!("released:{}", id.0)
}

/// A row of the `infractions` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfractionRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Store-assigned infraction id (UUID string)
    pub infraction_id: String,
    /// "ban" | "kick" | "voice_ban"
    pub kind: String,
    pub user_id: i64,
    pub actor_id: i64,
    pub reason: Option<String>,
    pub active: bool,
    /// Uniqueness key, see [`held_slot`] / [`released_slot`]
    pub active_slot: String,
    pub hidden: bool,
    #[serde(default, with = "surreal_datetime_opt")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "surreal_datetime")]
    pub inserted_at: DateTime<Utc>,
}

fn snowflake_to_db(id: UserId) -> StorageResult<i64> {
    i64::try_from(id.0)
        .map_err(|_| StorageError::Backend(format!("snowflake out of range: {}", id.0)))
}

fn snowflake_from_db(raw: i64) -> StorageResult<UserId> {
    u64::try_from(raw)
        .map(UserId)
        .map_err(|_| StorageError::Backend(format!("negative snowflake in row: {raw}")))
}

impl InfractionRow {
    /// Build the row for a freshly posted infraction.
    pub fn from_infraction(record: &Infraction) -> StorageResult<Self> {
        let active_slot = if record.active {
            held_slot(record.user_id, record.kind.as_str())
        } else {
            released_slot(&record.id)
        };

        Ok(InfractionRow {
            id: None,
            infraction_id: record.id.0.clone(),
            kind: record.kind.as_str().to_string(),
            user_id: snowflake_to_db(record.user_id)?,
            actor_id: snowflake_to_db(record.actor_id)?,
            reason: record.reason.clone(),
            active: record.active,
            active_slot,
            hidden: record.hidden,
            expires_at: record.expires_at,
            inserted_at: record.inserted_at,
        })
    }

    /// Convert back into the backend-agnostic record.
    pub fn into_infraction(self) -> StorageResult<Infraction> {
        Ok(Infraction {
            id: InfractionId(self.infraction_id),
            kind: self.kind.parse()?,
            user_id: snowflake_from_db(self.user_id)?,
            actor_id: snowflake_from_db(self.actor_id)?,
            reason: self.reason,
            active: self.active,
            hidden: self.hidden,
            expires_at: self.expires_at,
            inserted_at: self.inserted_at,
        })
    }
}
