//! `audit_logs` rows. Immutable once written.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffboard_core::audit::AuditEvent;
use staffboard_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub timestamp: Timestamp,
    pub user_id: Option<DbId>,
    pub user_email: Option<String>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub timestamp: Timestamp,
    pub user_id: Option<DbId>,
    pub user_email: Option<String>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
}

impl From<&AuditEvent> for CreateAuditLog {
    /// `details_json` carries the redacted payload, never the raw one.
    fn from(event: &AuditEvent) -> Self {
        Self {
            timestamp: event.occurred_at,
            user_id: event.actor_id,
            user_email: event.actor_email.clone(),
            action_type: event.action.clone(),
            entity_type: Some(event.entity_type.clone()),
            entity_id: event.entity_id,
            details_json: Some(event.redacted_values()),
            metadata: Some(event.metadata.clone()),
        }
    }
}
