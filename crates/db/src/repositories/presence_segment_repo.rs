//! Repository for the `staff_presence` table.

use sqlx::PgPool;
use staffboard_core::store::SegmentWrite;
use staffboard_core::types::{DbId, Timestamp};

use crate::models::presence::{CreateStaffPresence, StaffPresence};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, user_id, status_id, office_location_id, start_at, end_at, \
    notes, is_active, created_at, updated_at";

/// Provides query and write operations for presence segments.
pub struct PresenceSegmentRepo;

impl PresenceSegmentRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StaffPresence>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM staff_presence WHERE id = $1");
        sqlx::query_as::<_, StaffPresence>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active segments of a user whose start lies in `[start, end)`.
    pub async fn list_starting_in(
        pool: &PgPool,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<StaffPresence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM staff_presence \
             WHERE user_id = $1 AND is_active AND start_at >= $2 AND start_at < $3 \
             ORDER BY start_at ASC, id ASC"
        );
        sqlx::query_as::<_, StaffPresence>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Active segments of a user intersecting `[start, end)`, open-ended included.
    pub async fn list_overlapping(
        pool: &PgPool,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<StaffPresence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM staff_presence \
             WHERE user_id = $1 AND is_active AND start_at < $3 \
               AND (end_at IS NULL OR end_at > $2) \
             ORDER BY start_at ASC, id ASC"
        );
        sqlx::query_as::<_, StaffPresence>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Active segments of every user containing `at`.
    pub async fn list_active_at(pool: &PgPool, at: Timestamp) -> Result<Vec<StaffPresence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM staff_presence \
             WHERE is_active AND start_at <= $1 AND (end_at IS NULL OR end_at > $1) \
             ORDER BY user_id ASC, created_at DESC"
        );
        sqlx::query_as::<_, StaffPresence>(&query)
            .bind(at)
            .fetch_all(pool)
            .await
    }

    /// Apply one day's creates and extensions in a single transaction.
    ///
    /// Extensions only touch active rows owned by `user_id`; a missing row
    /// fails the whole batch with `RowNotFound`.
    pub async fn apply_writes(
        pool: &PgPool,
        user_id: DbId,
        writes: &[SegmentWrite],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut ids = Vec::with_capacity(writes.len());

        for write in writes {
            let id = match write {
                SegmentWrite::Extend {
                    id,
                    start_at,
                    end_at,
                    notes,
                } => {
                    sqlx::query_scalar::<_, DbId>(
                        "UPDATE staff_presence \
                         SET start_at = $3, end_at = $4, notes = COALESCE($5, notes), \
                             updated_at = NOW() \
                         WHERE id = $1 AND user_id = $2 AND is_active \
                         RETURNING id",
                    )
                    .bind(id)
                    .bind(user_id)
                    .bind(start_at)
                    .bind(end_at)
                    .bind(notes)
                    .fetch_one(&mut *tx)
                    .await?
                }
                SegmentWrite::Create(new) => {
                    let input = CreateStaffPresence::from(new);
                    sqlx::query_scalar::<_, DbId>(
                        "INSERT INTO staff_presence \
                            (user_id, status_id, office_location_id, start_at, end_at, notes) \
                         VALUES ($1, $2, $3, $4, $5, $6) \
                         RETURNING id",
                    )
                    .bind(input.user_id)
                    .bind(input.status_id)
                    .bind(input.office_location_id)
                    .bind(input.start_at)
                    .bind(input.end_at)
                    .bind(&input.notes)
                    .fetch_one(&mut *tx)
                    .await?
                }
            };
            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Soft-delete. Returns `true` if an active row was deactivated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE staff_presence SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
