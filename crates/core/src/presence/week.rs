//! Seven-day rolling view of one user's presence.
//!
//! Working days (those with office hours) are partitioned into explicit
//! schedule pieces clipped to the office-hours windows, with the gaps filled
//! by default office hours. Time-off replaces a day with one all-day entry
//! and is shown even on non-working days. Other non-working days are left out.

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::resolve::{pick_current, resolve_at_instant, weekday_number, LabelledSegment, PresenceKind, StatusClass};
use crate::store::OfficeHours;
use crate::timezone::{format_hhmm, local_day_window, local_to_utc, utc_to_local_time};
use crate::types::Timestamp;

/// Days covered by the view, today included.
pub const WEEK_VIEW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekEntry {
    /// Local `HH:MM`.
    pub from: String,
    pub to: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: PresenceKind,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub all_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub date: NaiveDate,
    /// `Monday`, `Tuesday`, ...
    pub weekday: String,
    pub entries: Vec<WeekEntry>,
}

/// Build the view for `today` and the six following days.
pub fn week_view(
    today: NaiveDate,
    tz: Tz,
    presences: &[LabelledSegment],
    hours: &[OfficeHours],
    default_location: &str,
) -> Vec<WeekDay> {
    (0..WEEK_VIEW_DAYS)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .filter_map(|date| {
            let entries = day_entries(date, tz, presences, hours, default_location);
            (!entries.is_empty()).then(|| WeekDay {
                date,
                weekday: date.format("%A").to_string(),
                entries,
            })
        })
        .collect()
}

fn day_entries(
    date: NaiveDate,
    tz: Tz,
    presences: &[LabelledSegment],
    hours: &[OfficeHours],
    default_location: &str,
) -> Vec<WeekEntry> {
    let (day_start, day_end) = local_day_window(date, tz);
    let mut windows: Vec<&OfficeHours> = hours
        .iter()
        .filter(|h| h.day_of_week == weekday_number(date) && h.start_time < h.end_time)
        .collect();
    windows.sort_by_key(|h| h.start_time);

    let time_off = pick_current(presences.iter().filter(|p| {
        p.segment.is_active
            && p.class() == StatusClass::TimeOff
            && p.segment.intersects(day_start, day_end)
    }));
    if let Some(off) = time_off {
        let (from, to) = match (windows.first(), windows.last()) {
            (Some(first), Some(last)) => (first.start_time, last.end_time),
            _ => (NaiveTime::MIN, end_of_day()),
        };
        let resolved = off.to_resolved();
        return vec![WeekEntry {
            from: format_hhmm(from),
            to: format_hhmm(to),
            status: resolved.status,
            kind: resolved.kind,
            location: resolved.location,
            notes: resolved.notes,
            all_day: true,
        }];
    }

    let scheduled: Vec<&LabelledSegment> = presences
        .iter()
        .filter(|p| p.segment.is_active && p.class() == StatusClass::Schedule)
        .collect();

    let mut entries = Vec::new();
    for window in windows {
        let open = local_to_utc(date, window.start_time, tz);
        let close = local_to_utc(date, window.end_time, tz);

        let mut pieces: Vec<(Timestamp, Timestamp)> = scheduled
            .iter()
            .filter(|p| p.segment.intersects(open, close))
            .map(|p| (p.segment.start_at.max(open), p.segment.end_or(close)))
            .collect();
        pieces.sort();

        let mut cursor = open;
        for (start, end) in pieces {
            if start > cursor {
                entries.push(piece(cursor, start, tz, presences, hours, default_location));
            }
            let start = start.max(cursor);
            if end > start {
                entries.push(piece(start, end, tz, presences, hours, default_location));
                cursor = end;
            }
        }
        if cursor < close {
            entries.push(piece(cursor, close, tz, presences, hours, default_location));
        }
    }
    entries
}

/// Label `[start, end)` by resolving its first instant.
fn piece(
    start: Timestamp,
    end: Timestamp,
    tz: Tz,
    presences: &[LabelledSegment],
    hours: &[OfficeHours],
    default_location: &str,
) -> WeekEntry {
    let resolved = resolve_at_instant(start, tz, presences, hours, default_location);
    WeekEntry {
        from: utc_to_local_time(start, tz),
        to: utc_to_local_time(end, tz),
        status: resolved.status,
        kind: resolved.kind,
        location: resolved.location,
        notes: resolved.notes,
        all_day: false,
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}
