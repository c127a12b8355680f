//! Per-date merge planning. Pure logic, no I/O.
//!
//! Given the active segments already stored for one local day and the
//! validated segments being submitted for it, decide which stored rows get
//! extended and which rows get created, and enforce the cumulative daily cap
//! and the no-overlap invariant over the resulting day.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};
use crate::store::{NewSegment, PresenceSegment, SegmentWrite};
use crate::timezone::utc_to_local_time;
use crate::types::{DbId, Timestamp, DAILY_CAP_MINUTES};
use crate::validation::ValidationError;

/// A submitted segment pinned to concrete UTC instants for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSegment {
    /// Position in the original request, for error field paths.
    pub index: usize,
    pub status_id: DbId,
    pub office_location_id: Option<DbId>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub notes: Option<String>,
}

/// The writes for one date plus the budget arithmetic behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub writes: Vec<SegmentWrite>,
    pub existing_minutes: i64,
    pub added_minutes: i64,
}

impl DayPlan {
    pub fn total_minutes(&self) -> i64 {
        self.existing_minutes + self.added_minutes
    }
}

/// Where a submitted segment ends up in the day after planning.
enum Target {
    Existing(usize),
    Created(usize),
}

fn minutes(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Plan one date. `window_end` is the exclusive end of the local day and caps
/// open-ended stored segments when summing their time.
pub fn plan_day_writes(
    user_id: DbId,
    date: NaiveDate,
    window_end: Timestamp,
    tz: Tz,
    existing: &[PresenceSegment],
    planned: &[PlannedSegment],
) -> CoreResult<DayPlan> {
    let existing_minutes: i64 = existing
        .iter()
        .map(|s| minutes(s.start_at, s.end_or(window_end).min(window_end)))
        .sum();

    // Working copies of the day, moved as merges are applied: `bounds` holds
    // the stored extent of each row, `day` the same extent clipped to the
    // window for minute counting and overlap checks.
    let mut bounds: Vec<(Timestamp, Timestamp)> = existing
        .iter()
        .map(|s| (s.start_at, s.end_or(window_end)))
        .collect();
    let mut day: Vec<(Timestamp, Timestamp)> = bounds
        .iter()
        .map(|&(start, end)| (start, end.min(window_end)))
        .collect();
    let mut created: Vec<(Timestamp, Timestamp)> = Vec::new();
    let mut targets = Vec::with_capacity(planned.len());
    let mut writes = Vec::with_capacity(planned.len());
    let mut added_minutes = 0;

    for seg in planned {
        // Open-ended rows are never merge targets: their end cannot be compared.
        let matching = existing.iter().position(|s| {
            s.end_at.is_some()
                && s.status_id == seg.status_id
                && s.office_location_id == seg.office_location_id
        });

        match matching {
            Some(idx) => {
                let (cur_start, cur_end) = bounds[idx];
                let merged = (cur_start.min(seg.start_at), cur_end.max(seg.end_at));
                let clipped = (merged.0, merged.1.min(window_end));
                added_minutes += minutes(clipped.0, clipped.1) - minutes(day[idx].0, day[idx].1);
                bounds[idx] = merged;
                day[idx] = clipped;
                writes.push(SegmentWrite::Extend {
                    id: existing[idx].id,
                    start_at: merged.0,
                    end_at: merged.1,
                    notes: seg.notes.clone(),
                });
                targets.push(Target::Existing(idx));
            }
            None => {
                added_minutes += minutes(seg.start_at, seg.end_at);
                created.push((seg.start_at, seg.end_at));
                writes.push(SegmentWrite::Create(NewSegment {
                    user_id,
                    status_id: seg.status_id,
                    office_location_id: seg.office_location_id,
                    start_at: seg.start_at,
                    end_at: seg.end_at,
                    notes: seg.notes.clone(),
                }));
                targets.push(Target::Created(created.len() - 1));
            }
        }
    }

    let total = existing_minutes + added_minutes;
    if total > DAILY_CAP_MINUTES {
        let message = if existing_minutes >= DAILY_CAP_MINUTES {
            "This day is already fully scheduled (8 hours)".to_string()
        } else {
            format!(
                "Adding these segments would exceed the 8-hour daily limit; \
                 {} minutes remaining",
                DAILY_CAP_MINUTES - existing_minutes
            )
        };
        return Err(CoreError::DailyCapExceeded { date, message });
    }

    let errors = overlap_errors(&day, &created, planned, &targets, tz);
    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    Ok(DayPlan {
        writes,
        existing_minutes,
        added_minutes,
    })
}

/// Check every interval a submitted segment produced against every other
/// interval of the resulting day.
fn overlap_errors(
    day: &[(Timestamp, Timestamp)],
    created: &[(Timestamp, Timestamp)],
    planned: &[PlannedSegment],
    targets: &[Target],
    tz: Tz,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (seg, target) in planned.iter().zip(targets) {
        let (start, end) = match *target {
            Target::Existing(i) => day[i],
            Target::Created(i) => created[i],
        };
        let others = day
            .iter()
            .enumerate()
            .filter(|(i, _)| !matches!(target, Target::Existing(t) if t == i))
            .map(|(_, iv)| iv)
            .chain(
                created
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !matches!(target, Target::Created(t) if t == i))
                    .map(|(_, iv)| iv),
            );

        let clash = others
            .filter(|(o_start, o_end)| start < *o_end && *o_start < end)
            .min_by_key(|(o_start, _)| *o_start);
        if let Some((o_start, o_end)) = clash {
            errors.push(ValidationError::new(
                format!("segments[{}]", seg.index),
                format!(
                    "Overlaps with an existing segment ({}-{})",
                    utc_to_local_time(*o_start, tz),
                    utc_to_local_time(*o_end, tz)
                ),
            ));
        }
    }

    errors
}
