//! Resolve-at-instant: which single presence applies to a user at a moment.

use std::cmp::Reverse;

use chrono::Datelike;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::registry::RegistrySnapshot;
use crate::store::{OfficeHours, PresenceSegment};
use crate::types::Timestamp;

/// Status codes that mean the person is out.
pub const TIME_OFF_CODES: &[&str] = &["VACATION", "SICK"];

/// Status codes that place the person on an explicit schedule.
/// `WORKING_REMOTE` is the registry spelling of `REMOTE`.
pub const SCHEDULE_CODES: &[&str] = &["AVAILABLE", "IN_OFFICE", "REMOTE", "WORKING_REMOTE"];

pub const AFTER_HOURS_LABEL: &str = "After Hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceKind {
    TimeOff,
    SpecificSchedule,
    DefaultOfficeHours,
    AfterHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    TimeOff,
    Schedule,
    Other,
}

pub fn classify(code: &str) -> StatusClass {
    if TIME_OFF_CODES.contains(&code) {
        StatusClass::TimeOff
    } else if SCHEDULE_CODES.contains(&code) {
        StatusClass::Schedule
    } else {
        StatusClass::Other
    }
}

/// Rank used to pick among concurrent segments; lower wins.
pub fn status_priority(code: &str) -> u8 {
    match classify(code) {
        StatusClass::TimeOff => 1,
        StatusClass::Schedule => 2,
        StatusClass::Other => 99,
    }
}

/// The effective presence of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStatus {
    /// Human-readable label.
    pub status: String,
    #[serde(rename = "type")]
    pub kind: PresenceKind,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub priority: u8,
}

// ---------------------------------------------------------------------------
// Labelled segments
// ---------------------------------------------------------------------------

/// A stored segment joined with its registry labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledSegment {
    pub segment: PresenceSegment,
    pub code: String,
    pub status_label: String,
    pub office_name: Option<String>,
}

impl LabelledSegment {
    pub fn class(&self) -> StatusClass {
        classify(&self.code)
    }

    pub fn priority(&self) -> u8 {
        status_priority(&self.code)
    }

    /// `Out of Office - Vacation`, `Available - Newport`, `Working Remote`.
    pub fn label(&self) -> String {
        match (self.class(), &self.office_name) {
            (StatusClass::TimeOff, _) => format!("Out of Office - {}", self.status_label),
            (_, Some(office)) => format!("{} - {}", self.status_label, office),
            (_, None) => self.status_label.clone(),
        }
    }

    pub fn to_resolved(&self) -> ResolvedStatus {
        let kind = match self.class() {
            StatusClass::TimeOff => PresenceKind::TimeOff,
            _ => PresenceKind::SpecificSchedule,
        };
        ResolvedStatus {
            status: self.label(),
            kind,
            location: self.office_name.clone(),
            notes: self.segment.notes.clone(),
            priority: self.priority(),
        }
    }
}

/// Join segments with the registry. Rows whose status has vanished keep an
/// empty code and resolve with the lowest priority.
pub fn label_segments(segments: Vec<PresenceSegment>, registry: &RegistrySnapshot) -> Vec<LabelledSegment> {
    segments
        .into_iter()
        .map(|segment| {
            let status = registry.status_by_id(segment.status_id);
            let office_name = segment
                .office_location_id
                .and_then(|id| registry.office_by_id(id))
                .map(|o| o.name.clone());
            LabelledSegment {
                code: status.map(|s| s.code.clone()).unwrap_or_default(),
                status_label: status.map(|s| s.label.clone()).unwrap_or_default(),
                office_name,
                segment,
            }
        })
        .collect()
}

/// Highest-priority segment, most recently created on ties.
pub fn pick_current<'a, I>(candidates: I) -> Option<&'a LabelledSegment>
where
    I: IntoIterator<Item = &'a LabelledSegment>,
{
    candidates
        .into_iter()
        .min_by_key(|s| (s.priority(), Reverse(s.segment.created_at)))
}

// ---------------------------------------------------------------------------
// Office hours
// ---------------------------------------------------------------------------

/// `0 = Sunday … 6 = Saturday`, matching `office_hours.day_of_week`.
pub fn weekday_number(date: chrono::NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

/// Windows configured for the weekday of `at` in `tz`.
pub fn hours_for_weekday<'a>(hours: &'a [OfficeHours], at: Timestamp, tz: Tz) -> Vec<&'a OfficeHours> {
    let day = weekday_number(at.with_timezone(&tz).date_naive());
    hours.iter().filter(|h| h.day_of_week == day).collect()
}

/// True when no window is configured for today, or none contains the time.
pub fn is_after_hours(at: Timestamp, tz: Tz, hours: &[OfficeHours]) -> bool {
    let time = at.with_timezone(&tz).time();
    !hours_for_weekday(hours, at, tz)
        .iter()
        .any(|h| h.contains(time))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve one user's presence at `at`: time-off, then explicit schedule,
/// then default office hours, then after hours.
pub fn resolve_at_instant(
    at: Timestamp,
    tz: Tz,
    presences: &[LabelledSegment],
    hours: &[OfficeHours],
    default_location: &str,
) -> ResolvedStatus {
    let active_of = |class: StatusClass| {
        pick_current(
            presences
                .iter()
                .filter(|p| p.segment.is_active && p.class() == class && p.segment.contains(at)),
        )
    };

    if let Some(off) = active_of(StatusClass::TimeOff) {
        return ResolvedStatus {
            priority: 1,
            ..off.to_resolved()
        };
    }
    if let Some(scheduled) = active_of(StatusClass::Schedule) {
        return ResolvedStatus {
            priority: 2,
            ..scheduled.to_resolved()
        };
    }
    if !is_after_hours(at, tz, hours) {
        return ResolvedStatus {
            status: format!("Default: {default_location}"),
            kind: PresenceKind::DefaultOfficeHours,
            location: Some(default_location.to_string()),
            notes: None,
            priority: 3,
        };
    }
    ResolvedStatus {
        status: AFTER_HOURS_LABEL.to_string(),
        kind: PresenceKind::AfterHours,
        location: None,
        notes: None,
        priority: 4,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::test_support::{
        hours, seeded_snapshot, weekday_hours, AVAILABLE, MEETING, NEWPORT, VACATION, WORKING_REMOTE,
    };
    use crate::timezone::local_to_utc;

    const TZ: Tz = chrono_tz::America::Los_Angeles;

    /// Monday 2025-01-06 at a local wall time.
    fn monday(time: &str) -> Timestamp {
        local_to_utc(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            TZ,
        )
    }

    fn segment(id: i64, status_id: i64, office: Option<i64>, start: Timestamp, end: Option<Timestamp>) -> PresenceSegment {
        PresenceSegment {
            id,
            user_id: 7,
            status_id,
            office_location_id: office,
            start_at: start,
            end_at: end,
            notes: None,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id),
        }
    }

    fn labelled(segments: Vec<PresenceSegment>) -> Vec<LabelledSegment> {
        label_segments(segments, &seeded_snapshot())
    }

    // -----------------------------------------------------------------------
    // Classification and labels
    // -----------------------------------------------------------------------

    #[test]
    fn priorities_follow_status_class() {
        assert_eq!(status_priority("VACATION"), 1);
        assert_eq!(status_priority("SICK"), 1);
        assert_eq!(status_priority("IN_OFFICE"), 2);
        assert_eq!(status_priority("WORKING_REMOTE"), 2);
        assert_eq!(status_priority("MEETING"), 99);
    }

    #[test]
    fn labels_by_class() {
        let segs = labelled(vec![
            segment(1, VACATION, None, monday("00:00"), None),
            segment(2, AVAILABLE, Some(NEWPORT), monday("09:00"), None),
            segment(3, WORKING_REMOTE, None, monday("09:00"), None),
        ]);
        assert_eq!(segs[0].label(), "Out of Office - Vacation");
        assert_eq!(segs[1].label(), "Available - Newport");
        assert_eq!(segs[2].label(), "Working Remote");
    }

    #[test]
    fn kind_serializes_kebab_case_under_type() {
        let resolved = resolve_at_instant(monday("22:00"), TZ, &[], &[], "Newport");
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["type"], "after-hours");
        assert_eq!(json["status"], "After Hours");
    }

    #[test]
    fn pick_prefers_priority_then_recency() {
        let segs = labelled(vec![
            segment(1, MEETING, None, monday("09:00"), None),
            segment(2, AVAILABLE, Some(NEWPORT), monday("09:00"), None),
            segment(3, WORKING_REMOTE, None, monday("09:00"), None),
        ]);
        assert_eq!(pick_current(&segs).unwrap().segment.id, 3);
    }

    // -----------------------------------------------------------------------
    // Resolution order
    // -----------------------------------------------------------------------

    #[test]
    fn schedule_segment_wins_over_default_hours() {
        let segs = labelled(vec![segment(
            1,
            AVAILABLE,
            Some(NEWPORT),
            monday("09:00"),
            Some(monday("12:00")),
        )]);
        let resolved = resolve_at_instant(monday("10:00"), TZ, &segs, &weekday_hours(7, "08:00", "17:00"), "Irvine");
        assert_eq!(resolved.kind, PresenceKind::SpecificSchedule);
        assert_eq!(resolved.status, "Available - Newport");
        assert_eq!(resolved.priority, 2);
    }

    #[test]
    fn default_hours_when_no_segment() {
        let resolved = resolve_at_instant(monday("13:00"), TZ, &[], &weekday_hours(7, "08:00", "17:00"), "Irvine");
        assert_eq!(resolved.status, "Default: Irvine");
        assert_eq!(resolved.kind, PresenceKind::DefaultOfficeHours);
        assert_eq!(resolved.priority, 3);
    }

    #[test]
    fn office_hours_end_is_exclusive() {
        let resolved = resolve_at_instant(monday("17:00"), TZ, &[], &weekday_hours(7, "08:00", "17:00"), "Irvine");
        assert_eq!(resolved.kind, PresenceKind::AfterHours);
    }

    #[test]
    fn other_statuses_do_not_resolve_as_schedule() {
        let segs = labelled(vec![segment(1, MEETING, None, monday("09:00"), Some(monday("10:00")))]);
        let resolved = resolve_at_instant(monday("09:30"), TZ, &segs, &[], "Irvine");
        assert_eq!(resolved.kind, PresenceKind::AfterHours);
    }

    #[test]
    fn after_hours_without_configuration() {
        assert!(is_after_hours(monday("10:00"), TZ, &[]));
        // Sunday window does not apply on Monday.
        assert!(is_after_hours(monday("10:00"), TZ, &[hours(7, 0, "08:00", "17:00")]));
        assert!(!is_after_hours(monday("10:00"), TZ, &[hours(7, 1, "08:00", "17:00")]));
    }

    proptest! {
        #[test]
        fn time_off_always_beats_schedule(minute in 0i64..(24 * 60), open_ended in any::<bool>()) {
            let day_start = monday("00:00");
            let at = day_start + Duration::minutes(minute);
            let end = (!open_ended).then(|| day_start + Duration::days(1));
            let segs = labelled(vec![
                segment(1, VACATION, None, day_start, end),
                segment(2, AVAILABLE, Some(NEWPORT), day_start, end),
            ]);
            let resolved = resolve_at_instant(at, TZ, &segs, &weekday_hours(7, "00:00", "23:59"), "Irvine");
            prop_assert_eq!(resolved.kind, PresenceKind::TimeOff);
            prop_assert_eq!(resolved.priority, 1);
        }
    }
}
