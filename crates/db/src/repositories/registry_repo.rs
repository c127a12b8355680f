//! Repositories for the `presence_statuses` and `office_locations` tables.

use sqlx::PgPool;

use crate::models::registry::{OfficeLocation, PresenceStatus};

const STATUS_COLUMNS: &str = "id, code, label, requires_office, is_active, created_at, updated_at";

const OFFICE_COLUMNS: &str = "id, code, name, is_active, created_at, updated_at";

pub struct PresenceStatusRepo;

impl PresenceStatusRepo {
    /// Every status, inactive included, ordered by code.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PresenceStatus>, sqlx::Error> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM presence_statuses ORDER BY code ASC");
        sqlx::query_as::<_, PresenceStatus>(&query).fetch_all(pool).await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<PresenceStatus>, sqlx::Error> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM presence_statuses WHERE code = $1");
        sqlx::query_as::<_, PresenceStatus>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Toggle availability for new segments. Returns `true` if a row changed.
    pub async fn set_active(pool: &PgPool, code: &str, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE presence_statuses SET is_active = $2, updated_at = NOW() WHERE code = $1",
        )
        .bind(code)
        .bind(active)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct OfficeLocationRepo;

impl OfficeLocationRepo {
    /// Every office, inactive included, ordered by code.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<OfficeLocation>, sqlx::Error> {
        let query = format!("SELECT {OFFICE_COLUMNS} FROM office_locations ORDER BY code ASC");
        sqlx::query_as::<_, OfficeLocation>(&query).fetch_all(pool).await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<OfficeLocation>, sqlx::Error> {
        let query = format!("SELECT {OFFICE_COLUMNS} FROM office_locations WHERE code = $1");
        sqlx::query_as::<_, OfficeLocation>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }
}
