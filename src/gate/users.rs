//! User profile lookup by auth identity.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{instrument, Instrument};
use uuid::Uuid;

use super::error::GateError;

/// Portal profile fields the gate cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub role: String,
    pub is_active: bool,
    pub first_login: bool,
    pub station_id: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up the profile linked to an auth identity, `Ok(None)` if there is none.
    async fn find_by_auth_id(&self, auth_id: Uuid) -> Result<Option<UserProfile>, GateError>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_auth_id(&self, auth_id: Uuid) -> Result<Option<UserProfile>, GateError> {
        let query = r"
            SELECT role, is_active, first_login, station_id
            FROM users
            WHERE auth_id = $1
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(auth_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            role: row.try_get("role")?,
            is_active: row.try_get("is_active")?,
            first_login: row.try_get("first_login")?,
            station_id: row.try_get("station_id")?,
        }))
    }
}
