//! SurrealDB-backed InfractionStore implementation
//!
//! Uses `schema::InfractionRow` for persistence, converting to/from
//! `storage_traits` types at the boundary.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::connection::{self, CloudConfig, LOCAL_DB_PATH};
use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{released_slot, InfractionRow};
use crate::storage_traits::{
    Infraction, InfractionId, InfractionKind, InfractionStore, NewInfraction, StorageResult,
    UserId,
};

/// SurrealDB-backed implementation of [`InfractionStore`].
pub struct SurrealInfractionStore {
    db: Surreal<Any>,
}

impl SurrealInfractionStore {
    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = connection::connect_url("mem://").await?;
        migrations::init_schema(&db).await?;

        info!("SurrealInfractionStore connected (in-memory)");
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Tries, in order: [`CloudConfig::from_env`], `SURREALDB_URL`, then local
    /// persistence under `.infractions/db`.
    pub async fn from_env() -> crate::Result<Self> {
        if let Ok(config) = CloudConfig::from_env() {
            let db = connection::connect_cloud(&config).await?;
            migrations::init_schema(&db).await?;
            info!("SurrealInfractionStore connected (cloud)");
            return Ok(Self { db });
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            let db = connection::connect_url(&url).await?;
            migrations::init_schema(&db).await?;
            info!("SurrealInfractionStore connected ({})", url);
            return Ok(Self { db });
        }

        std::fs::create_dir_all(LOCAL_DB_PATH).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                LOCAL_DB_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", LOCAL_DB_PATH);
        info!(
            "No cloud config or SURREALDB_URL found, using local persistence: {}",
            url
        );

        let db = connection::connect_url(&url).await?;
        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    // -- private helpers -----------------------------------------------------

    /// Fetch a row by infraction id, or NotFound.
    async fn fetch(&self, id: &InfractionId) -> StorageResult<InfractionRow> {
        let mut res = self
            .db
            .query("SELECT * FROM infractions WHERE infraction_id = $iid")
            .bind(("iid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<InfractionRow> = res.take(0).map_err(backend)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound {
                id: id.0.clone(),
            })
    }
}

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Map an insert failure, recognising the active-slot UNIQUE violation.
fn classify_insert_error(err: surrealdb::Error, record: &Infraction) -> StorageError {
    let msg = err.to_string();
    if msg.contains("idx_active_slot") {
        StorageError::DuplicateActive {
            user_id: record.user_id.0,
            kind: record.kind.as_str().to_string(),
        }
    } else {
        StorageError::Backend(msg)
    }
}

fn to_db_id(user_id: UserId) -> StorageResult<i64> {
    i64::try_from(user_id.0)
        .map_err(|_| StorageError::Backend(format!("snowflake out of range: {}", user_id)))
}

#[async_trait]
impl InfractionStore for SurrealInfractionStore {
    async fn active(
        &self,
        user_id: UserId,
        kind: InfractionKind,
    ) -> StorageResult<Option<Infraction>> {
        let uid = to_db_id(user_id)?;
        let mut res = self
            .db
            .query(
                "SELECT * FROM infractions \
                 WHERE user_id = $uid AND kind = $kind AND active = true LIMIT 1",
            )
            .bind(("uid", uid))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<InfractionRow> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .map(InfractionRow::into_infraction)
            .transpose()
    }

    async fn post(&self, draft: NewInfraction) -> StorageResult<Infraction> {
        let record = Infraction::from_draft(draft);
        let row = InfractionRow::from_infraction(&record)?;

        debug!(infraction_id = %record.id, kind = %record.kind, user_id = %record.user_id, "creating infraction");

        let created: Option<InfractionRow> = self
            .db
            .create("infractions")
            .content(row)
            .await
            .map_err(|e| classify_insert_error(e, &record))?;

        created
            .ok_or_else(|| StorageError::Backend("create returned no row".to_string()))?
            .into_infraction()
    }

    async fn deactivate(&self, id: &InfractionId) -> StorageResult<Infraction> {
        let row = self.fetch(id).await?;
        if !row.active {
            return row.into_infraction();
        }

        let mut res = self
            .db
            .query(
                "UPDATE infractions SET active = false, active_slot = $slot \
                 WHERE infraction_id = $iid RETURN AFTER",
            )
            .bind(("slot", released_slot(id)))
            .bind(("iid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<InfractionRow> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound {
                id: id.0.clone(),
            })?
            .into_infraction()
    }

    async fn get(&self, id: &InfractionId) -> StorageResult<Infraction> {
        self.fetch(id).await?.into_infraction()
    }

    async fn history(&self, user_id: UserId) -> StorageResult<Vec<Infraction>> {
        let uid = to_db_id(user_id)?;
        let mut res = self
            .db
            .query("SELECT * FROM infractions WHERE user_id = $uid ORDER BY inserted_at ASC")
            .bind(("uid", uid))
            .await
            .map_err(backend)?;

        let rows: Vec<InfractionRow> = res.take(0).map_err(backend)?;
        rows.into_iter().map(InfractionRow::into_infraction).collect()
    }
}
