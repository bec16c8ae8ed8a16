//! Administrator credential lookup.
//!
//! The login flow only ever reads records; provisioning happens out of band
//! (`hiregate create-admin`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

pub const ADMIN_ROLE: &str = "admin";

/// One stored administrator.
#[derive(Clone)]
pub struct AdministratorRecord {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// Keep the hash out of logs.
impl std::fmt::Debug for AdministratorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdministratorRecord")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("credential store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the administrator with the given username.
    ///
    /// # Errors
    /// Returns `StorageError` when the backing store cannot be queried. A
    /// missing record is `Ok(None)`, never an error.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdministratorRecord>, StorageError>;
}

/// `admins` table in `PostgreSQL`.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdministratorRecord>, StorageError> {
        let query = r"
            SELECT username, password_hash, role, created_at
            FROM admins
            WHERE username = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.sql.table = "admins"
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        let record = row
            .map(|row| -> Result<AdministratorRecord, sqlx::Error> {
                Ok(AdministratorRecord {
                    username: row.try_get("username")?,
                    password_hash: row.try_get("password_hash")?,
                    role: row.try_get("role")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .transpose()?;

        Ok(record)
    }
}
