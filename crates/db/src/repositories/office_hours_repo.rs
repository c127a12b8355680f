//! Repository for the `office_hours` table.

use sqlx::PgPool;
use staffboard_core::types::DbId;

use crate::models::presence::{CreateOfficeHours, OfficeHours};

const COLUMNS: &str = "id, user_id, day_of_week, start_time, end_time";

pub struct OfficeHoursRepo;

impl OfficeHoursRepo {
    /// Windows of every listed user, ordered by user, weekday and start.
    pub async fn list_for_users(pool: &PgPool, user_ids: &[DbId]) -> Result<Vec<OfficeHours>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM office_hours WHERE user_id = ANY($1) \
             ORDER BY user_id ASC, day_of_week ASC, start_time ASC"
        );
        sqlx::query_as::<_, OfficeHours>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateOfficeHours) -> Result<OfficeHours, sqlx::Error> {
        let query = format!(
            "INSERT INTO office_hours (user_id, day_of_week, start_time, end_time) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OfficeHours>(&query)
            .bind(input.user_id)
            .bind(input.day_of_week)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(pool)
            .await
    }
}
