//! Repository for the `audit_logs` table.

use sqlx::PgPool;
use staffboard_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

const COLUMNS: &str = "\
    id, timestamp, user_id, user_email, action_type, entity_type, \
    entity_id, details_json, metadata, created_at";

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs \
                (timestamp, user_id, user_email, action_type, entity_type, entity_id, \
                 details_json, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.timestamp)
            .bind(entry.user_id)
            .bind(&entry.user_email)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.details_json)
            .bind(&entry.metadata)
            .fetch_one(pool)
            .await
    }

    /// Entries for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY timestamp DESC, id DESC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
