//! `staff_presence` and `office_hours` rows.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffboard_core::store::{self, NewSegment};
use staffboard_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StaffPresence {
    pub id: DbId,
    pub user_id: DbId,
    pub status_id: DbId,
    pub office_location_id: Option<DbId>,
    pub start_at: Timestamp,
    pub end_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<StaffPresence> for store::PresenceSegment {
    fn from(row: StaffPresence) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status_id: row.status_id,
            office_location_id: row.office_location_id,
            start_at: row.start_at,
            end_at: row.end_at,
            notes: row.notes,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// DTO for inserting a segment. Open-ended rows are only ever seeded, so
/// `end_at` stays optional here even though the planner always closes them.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStaffPresence {
    pub user_id: DbId,
    pub status_id: DbId,
    pub office_location_id: Option<DbId>,
    pub start_at: Timestamp,
    pub end_at: Option<Timestamp>,
    pub notes: Option<String>,
}

impl From<&NewSegment> for CreateStaffPresence {
    fn from(new: &NewSegment) -> Self {
        Self {
            user_id: new.user_id,
            status_id: new.status_id,
            office_location_id: new.office_location_id,
            start_at: new.start_at,
            end_at: Some(new.end_at),
            notes: new.notes.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Office hours
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OfficeHours {
    pub id: DbId,
    pub user_id: DbId,
    /// 0 = Sunday.
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<OfficeHours> for store::OfficeHours {
    fn from(row: OfficeHours) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOfficeHours {
    pub user_id: DbId,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
