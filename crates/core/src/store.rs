//! Domain entities and the persistence seams the scheduling core depends on.
//!
//! These structs intentionally mirror the `db` crate's row models because
//! `core` must have zero internal deps; the `db` crate converts between them.

use async_trait::async_trait;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Registry entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStatus {
    pub id: DbId,
    pub code: String,
    pub label: String,
    pub requires_office: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeLocation {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// A stored `staff_presence` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSegment {
    pub id: DbId,
    pub user_id: DbId,
    pub status_id: DbId,
    pub office_location_id: Option<DbId>,
    pub start_at: Timestamp,
    /// `None` means open-ended.
    pub end_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl PresenceSegment {
    /// Whether `[start_at, end_at)` contains `at`.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start_at <= at && self.end_at.map_or(true, |end| at < end)
    }

    /// Whether the segment intersects `[start, end)`.
    pub fn intersects(&self, start: Timestamp, end: Timestamp) -> bool {
        self.start_at < end && self.end_at.map_or(true, |e| e > start)
    }

    /// End instant, with open-ended segments capped at `horizon`.
    pub fn end_or(&self, horizon: Timestamp) -> Timestamp {
        self.end_at.map_or(horizon, |end| end.min(horizon))
    }
}

/// Insert payload for a new segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSegment {
    pub user_id: DbId,
    pub status_id: DbId,
    pub office_location_id: Option<DbId>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub notes: Option<String>,
}

/// One write in a day's unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentWrite {
    /// Move an existing segment's bounds. `notes: None` keeps the stored notes.
    Extend {
        id: DbId,
        start_at: Timestamp,
        end_at: Timestamp,
        notes: Option<String>,
    },
    Create(NewSegment),
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// A recurring weekly office-hours window. `day_of_week` is 0 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeHours {
    pub id: DbId,
    pub user_id: DbId,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl OfficeHours {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// A staff member shown on the presence board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    /// Human name of the office used for default office hours.
    pub default_location: Option<String>,
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Persistence operations over presence segments, office hours and the roster.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Active segments of `user_id` whose start lies in `[start, end)`.
    async fn segments_starting_in(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>>;

    /// Active segments of `user_id` intersecting `[start, end)`, open-ended included.
    async fn segments_overlapping(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>>;

    /// Active segments of every user that contain `at`.
    async fn segments_active_at(&self, at: Timestamp) -> CoreResult<Vec<PresenceSegment>>;

    async fn find_segment(&self, id: DbId) -> CoreResult<Option<PresenceSegment>>;

    /// Apply one date's writes atomically. Returns the touched ids in write order.
    async fn apply_day_plan(&self, user_id: DbId, writes: &[SegmentWrite]) -> CoreResult<Vec<DbId>>;

    /// Soft-delete. Returns `false` if the segment was missing or already inactive.
    async fn deactivate_segment(&self, id: DbId) -> CoreResult<bool>;

    async fn office_hours(&self, user_ids: &[DbId]) -> CoreResult<Vec<OfficeHours>>;

    async fn roster(&self) -> CoreResult<Vec<StaffMember>>;

    async fn staff_member(&self, id: DbId) -> CoreResult<Option<StaffMember>>;
}

/// Source of status and office reference rows, inactive rows included.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch_statuses(&self) -> CoreResult<Vec<PresenceStatus>>;
    async fn fetch_offices(&self) -> CoreResult<Vec<OfficeLocation>>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn segment(start_h: u32, end_h: Option<u32>) -> PresenceSegment {
        let day = |h| Utc.with_ymd_and_hms(2025, 1, 6, h, 0, 0).unwrap();
        PresenceSegment {
            id: 1,
            user_id: 1,
            status_id: 1,
            office_location_id: None,
            start_at: day(start_h),
            end_at: end_h.map(day),
            notes: None,
            is_active: true,
            created_at: day(0),
        }
    }

    #[test]
    fn contains_is_half_open() {
        let s = segment(9, Some(17));
        assert!(s.contains(s.start_at));
        assert!(!s.contains(s.end_at.unwrap()));
    }

    #[test]
    fn open_ended_contains_far_future() {
        let s = segment(9, None);
        assert!(s.contains(s.start_at + Duration::days(365)));
    }

    #[test]
    fn intersects_rejects_touching() {
        let s = segment(9, Some(12));
        let noon = s.end_at.unwrap();
        assert!(!s.intersects(noon, noon + Duration::hours(1)));
        assert!(s.intersects(noon - Duration::minutes(1), noon));
    }

    #[test]
    fn end_or_caps_open_ended() {
        let s = segment(9, None);
        let horizon = s.start_at + Duration::hours(3);
        assert_eq!(s.end_or(horizon), horizon);
    }
}
