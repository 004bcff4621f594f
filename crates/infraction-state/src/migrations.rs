//! SurrealDB schema migrations and initialization

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all infraction tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing infraction schema");
    init_infractions_table(db).await?;
    info!("Infraction schema initialization complete");
    Ok(())
}

/// Initialize `infractions` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE infractions {
///   infraction_id:  STRING (unique)
///   kind:           STRING (ban | kick | voice_ban)
///   user_id:        INT (indexed)
///   actor_id:       INT
///   reason:         STRING?
///   active:         BOOL
///   active_slot:    STRING (unique)
///   hidden:         BOOL
///   expires_at:     DATETIME?
///   inserted_at:    DATETIME
/// }
/// ```
///
/// Constraints:
/// - `active_slot` is `"<user_id>:<kind>"` while active and
///   `"released:<infraction_id>"` otherwise, so the UNIQUE index admits at
///   most one active infraction per (user, kind). A conflicting insert fails
///   inside the database, closing the lookup-then-insert race.
/// - Records are never deleted.
async fn init_infractions_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing infractions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS infractions AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_infraction_id ON TABLE infractions COLUMNS infraction_id UNIQUE;

        -- At most one active infraction per (user, kind)
        DEFINE INDEX IF NOT EXISTS idx_active_slot ON TABLE infractions COLUMNS active_slot UNIQUE;

        DEFINE INDEX IF NOT EXISTS idx_user_id ON TABLE infractions COLUMNS user_id;
        DEFINE INDEX IF NOT EXISTS idx_user_kind_active ON TABLE infractions COLUMNS user_id, kind, active;
    "#;

    db.query(sql).await?.check()?;
    info!("infractions table initialized");
    Ok(())
}
