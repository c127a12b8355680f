//! `presence_statuses` and `office_locations` rows.

use serde::Serialize;
use sqlx::FromRow;
use staffboard_core::store;
use staffboard_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PresenceStatus {
    pub id: DbId,
    pub code: String,
    pub label: String,
    pub requires_office: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<PresenceStatus> for store::PresenceStatus {
    fn from(row: PresenceStatus) -> Self {
        Self {
            id: row.id,
            code: row.code,
            label: row.label,
            requires_office: row.requires_office,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OfficeLocation {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<OfficeLocation> for store::OfficeLocation {
    fn from(row: OfficeLocation) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            is_active: row.is_active,
        }
    }
}
