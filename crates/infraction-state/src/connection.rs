//! SurrealDB connection settings
//!
//! Supports in-memory, local (surrealkv) and cloud (WebSocket) databases.

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{info, instrument};

use crate::error::StateError;
use crate::Result;

/// Default namespace for infraction data
pub const DEFAULT_NAMESPACE: &str = "moderation";
/// Default database for infraction data
pub const DEFAULT_DATABASE: &str = "infractions";
/// Local persistence directory used when no remote database is configured
pub const LOCAL_DB_PATH: &str = ".infractions/db";

/// Configuration for a remote SurrealDB connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Namespace (default: "moderation")
    pub namespace: String,
    /// Database name (default: "infractions")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new cloud configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "moderation")
    /// - SURREALDB_DATABASE (optional, default: "infractions")
    /// - SURREALDB_ROOT (optional, default: "false")
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database = std::env::var("SURREALDB_DATABASE")
            .unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Connect to `url` and select the default namespace/database.
pub(crate) async fn connect_url(url: &str) -> Result<Surreal<Any>> {
    let db = surrealdb::engine::any::connect(url)
        .await
        .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

    db.use_ns(DEFAULT_NAMESPACE)
        .use_db(DEFAULT_DATABASE)
        .await
        .map_err(|e| StateError::Connection(e.to_string()))?;

    Ok(db)
}

/// Connect to a remote database and authenticate.
#[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
pub(crate) async fn connect_cloud(config: &CloudConfig) -> Result<Surreal<Any>> {
    info!("Connecting to SurrealDB (root={})", config.is_root);

    let db = surrealdb::engine::any::connect(&config.endpoint)
        .await
        .map_err(|e| {
            StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
        })?;

    if config.is_root {
        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
    } else {
        db.signin(Database {
            namespace: &config.namespace,
            database: &config.database,
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
    }

    db.use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .map_err(|e| StateError::Connection(e.to_string()))?;

    Ok(db)
}
