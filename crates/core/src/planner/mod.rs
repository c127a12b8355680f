//! The plan-day workflow and the segment operations that sit beside it.
//!
//! [`DayPlanner::plan_day`] validates a request, expands its date range and,
//! per date, merges the submitted segments into what is already stored
//! before committing. Each date is its own unit of work: a failure on a later
//! date leaves earlier dates committed.

pub mod locks;
pub mod merge;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::audit::{actions, AuditEvent, AuditSink, ENTITY_STAFF_PRESENCE};
use crate::config::PresenceConfig;
use crate::error::{CoreError, CoreResult};
use crate::registry::{RegistryCache, RegistrySnapshot};
use crate::roles::{can_edit_schedule, can_view_schedule, Actor};
use crate::store::{PresenceSegment, PresenceStore};
use crate::timezone::{days_inclusive, local_day_window, local_to_utc, parse_date, utc_to_local_time};
use crate::types::{DbId, Timestamp, DAILY_CAP_MINUTES};
use crate::validation::{validate_segments, SegmentInput, ValidatedSegment, ValidationError};

use self::locks::UserLocks;
use self::merge::{plan_day_writes, PlannedSegment};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDayRequest {
    /// Whose schedule to plan; the actor's own when absent.
    #[serde(default)]
    pub user_id: Option<DbId>,
    /// First local date, `YYYY-MM-DD`.
    pub date: String,
    /// Last local date of a daily repeat, inclusive.
    #[serde(default)]
    pub repeat_until: Option<String>,
    pub segments: Vec<SegmentInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDayResult {
    pub success: bool,
    /// Segments created or extended on the first date of the range.
    pub created_ids: Vec<DbId>,
    pub days_affected: usize,
}

/// One stored segment of a day, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScheduleEntry {
    pub id: DbId,
    pub status_code: String,
    pub status_label: String,
    pub office_name: Option<String>,
    pub from: String,
    pub to: String,
    pub minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub user_id: DbId,
    pub date: NaiveDate,
    pub segments: Vec<DayScheduleEntry>,
    pub scheduled_minutes: i64,
    pub remaining_minutes: i64,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

pub struct DayPlanner {
    store: Arc<dyn PresenceStore>,
    registry: Arc<RegistryCache>,
    audit: Arc<dyn AuditSink>,
    timezone: Tz,
    locks: UserLocks,
}

fn require_actor(actor: Option<&Actor>) -> CoreResult<&Actor> {
    actor.ok_or_else(|| CoreError::Unauthorized("No authenticated actor".into()))
}

/// Parse the request's date range, collecting problems as field errors.
fn parse_range(req: &PlanDayRequest) -> Result<(NaiveDate, NaiveDate), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let start = parse_date(&req.date)
        .map_err(|_| errors.push(ValidationError::new("date", "Invalid date, expected YYYY-MM-DD")))
        .ok();
    let end = match req.repeat_until.as_deref() {
        None => start,
        Some(raw) => parse_date(raw)
            .map_err(|_| {
                errors.push(ValidationError::new(
                    "repeatUntil",
                    "Invalid date, expected YYYY-MM-DD",
                ))
            })
            .ok(),
    };

    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            errors.push(ValidationError::new(
                "repeatUntil",
                "Repeat end date cannot be before the start date",
            ));
            Err(errors)
        }
        (Some(start), Some(end)) if errors.is_empty() => Ok((start, end)),
        _ => Err(errors),
    }
}

impl DayPlanner {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        registry: Arc<RegistryCache>,
        audit: Arc<dyn AuditSink>,
        config: &PresenceConfig,
    ) -> Self {
        Self {
            store,
            registry,
            audit,
            timezone: config.timezone,
            locks: UserLocks::new(),
        }
    }

    /// Plan one day, or every day of a daily repeat, for a user.
    pub async fn plan_day(&self, actor: Option<&Actor>, req: PlanDayRequest) -> CoreResult<PlanDayResult> {
        let actor = require_actor(actor)?;

        let registry = self.registry.snapshot().await?;
        let range = parse_range(&req);
        let segments = validate_segments(&req.segments, &registry);
        let ((start, end), segments) = match (range, segments) {
            (Ok(range), Ok(segments)) => (range, segments),
            (range, segments) => {
                let mut errors = range.err().unwrap_or_default();
                errors.extend(segments.err().unwrap_or_default());
                return Err(CoreError::Validation(errors));
            }
        };

        let target_user_id = req.user_id.unwrap_or(actor.id);
        if !can_edit_schedule(actor, target_user_id) {
            return Err(CoreError::Forbidden(format!(
                "Not allowed to edit the schedule of user {target_user_id}"
            )));
        }

        let _guard = self.locks.acquire(target_user_id).await;

        let mut created_ids = Vec::new();
        let mut days_affected = 0;
        for date in days_inclusive(start, end) {
            match self.plan_one_date(target_user_id, date, &segments).await {
                Ok(ids) => {
                    if days_affected == 0 {
                        created_ids = ids;
                    }
                    days_affected += 1;
                }
                Err(err) => {
                    if days_affected > 0 {
                        tracing::warn!(
                            user_id = target_user_id,
                            failed_date = %date,
                            days_affected,
                            error = %err,
                            "Repeat range stopped; earlier dates stay committed"
                        );
                        self.audit_plan(actor, target_user_id, &req, &created_ids, days_affected, Some(date));
                    }
                    return Err(err);
                }
            }
        }

        tracing::info!(
            user_id = target_user_id,
            actor_id = actor.id,
            start = %start,
            end = %end,
            days_affected,
            "Day plan committed"
        );
        self.audit_plan(actor, target_user_id, &req, &created_ids, days_affected, None);

        Ok(PlanDayResult {
            success: true,
            created_ids,
            days_affected,
        })
    }

    async fn plan_one_date(
        &self,
        user_id: DbId,
        date: NaiveDate,
        segments: &[ValidatedSegment],
    ) -> CoreResult<Vec<DbId>> {
        let (window_start, window_end) = local_day_window(date, self.timezone);
        let existing = self
            .store
            .segments_starting_in(user_id, window_start, window_end)
            .await?;

        let planned: Vec<PlannedSegment> = segments
            .iter()
            .map(|seg| PlannedSegment {
                index: seg.index,
                status_id: seg.status.id,
                office_location_id: seg.office.as_ref().map(|o| o.id),
                start_at: local_to_utc(date, seg.from, self.timezone),
                end_at: local_to_utc(date, seg.to, self.timezone),
                notes: seg.notes.clone(),
            })
            .collect();

        let plan = plan_day_writes(user_id, date, window_end, self.timezone, &existing, &planned)?;
        let mut ids = self.store.apply_day_plan(user_id, &plan.writes).await?;
        // Several submitted segments may fold into the same stored row.
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(*id));

        tracing::debug!(
            user_id,
            date = %date,
            existing_minutes = plan.existing_minutes,
            added_minutes = plan.added_minutes,
            writes = ids.len(),
            "Date planned"
        );
        Ok(ids)
    }

    fn audit_plan(
        &self,
        actor: &Actor,
        target_user_id: DbId,
        req: &PlanDayRequest,
        created_ids: &[DbId],
        days_affected: usize,
        failed_date: Option<NaiveDate>,
    ) {
        let mut event = AuditEvent::new(actions::PRESENCE_PLAN_DAY, ENTITY_STAFF_PRESENCE)
            .with_actor(actor.id, actor.email.clone())
            .with_new_values(serde_json::json!({
                "userId": target_user_id,
                "date": req.date,
                "repeatUntil": req.repeat_until,
                "segmentCount": req.segments.len(),
                "daysAffected": days_affected,
                "createdIds": created_ids,
            }))
            .with_metadata(serde_json::json!({
                "partial": failed_date.is_some(),
                "failedDate": failed_date.map(|d| d.to_string()),
            }));
        if let Some(first) = created_ids.first() {
            event = event.with_entity(*first);
        }
        self.audit.log_event(event);
    }

    /// Soft-delete a segment. The owner or an admin may do this.
    pub async fn deactivate_segment(&self, actor: Option<&Actor>, segment_id: DbId) -> CoreResult<()> {
        let actor = require_actor(actor)?;
        let segment = self
            .store
            .find_segment(segment_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(CoreError::NotFound {
                entity: ENTITY_STAFF_PRESENCE,
                id: segment_id,
            })?;

        if !can_edit_schedule(actor, segment.user_id) {
            return Err(CoreError::Forbidden(format!(
                "Not allowed to edit the schedule of user {}",
                segment.user_id
            )));
        }

        let _guard = self.locks.acquire(segment.user_id).await;
        if !self.store.deactivate_segment(segment_id).await? {
            // Deactivated by someone else since the lookup.
            return Err(CoreError::NotFound {
                entity: ENTITY_STAFF_PRESENCE,
                id: segment_id,
            });
        }

        tracing::info!(segment_id, user_id = segment.user_id, actor_id = actor.id, "Segment deactivated");
        self.audit.log_event(
            AuditEvent::new(actions::PRESENCE_DEACTIVATE, ENTITY_STAFF_PRESENCE)
                .with_entity(segment_id)
                .with_actor(actor.id, actor.email.clone())
                .with_new_values(serde_json::json!({
                    "userId": segment.user_id,
                    "isActive": false,
                })),
        );
        Ok(())
    }

    /// The active segments of one local day with the remaining budget.
    pub async fn day_schedule(
        &self,
        actor: Option<&Actor>,
        user_id: Option<DbId>,
        date: &str,
    ) -> CoreResult<DaySchedule> {
        let actor = require_actor(actor)?;
        let user_id = user_id.unwrap_or(actor.id);
        if !can_edit_schedule(actor, user_id) && !can_view_schedule(actor, user_id) {
            return Err(CoreError::Forbidden(format!(
                "Not allowed to view the schedule of user {user_id}"
            )));
        }

        let date = parse_date(date)?;
        let (window_start, window_end) = local_day_window(date, self.timezone);
        let mut segments = self
            .store
            .segments_starting_in(user_id, window_start, window_end)
            .await?;
        segments.sort_by_key(|s| s.start_at);

        let registry = self.registry.snapshot().await?;
        let entries: Vec<DayScheduleEntry> = segments
            .iter()
            .map(|s| self.schedule_entry(s, window_end, &registry))
            .collect();
        let scheduled_minutes = entries.iter().map(|e| e.minutes).sum();

        Ok(DaySchedule {
            user_id,
            date,
            segments: entries,
            scheduled_minutes,
            remaining_minutes: (DAILY_CAP_MINUTES - scheduled_minutes).max(0),
        })
    }

    fn schedule_entry(
        &self,
        segment: &PresenceSegment,
        window_end: Timestamp,
        registry: &RegistrySnapshot,
    ) -> DayScheduleEntry {
        let status = registry.status_by_id(segment.status_id);
        let end = segment.end_or(window_end).min(window_end);
        DayScheduleEntry {
            id: segment.id,
            status_code: status.map_or_else(String::new, |s| s.code.clone()),
            status_label: status.map_or_else(String::new, |s| s.label.clone()),
            office_name: segment
                .office_location_id
                .and_then(|id| registry.office_by_id(id))
                .map(|o| o.name.clone()),
            from: utc_to_local_time(segment.start_at, self.timezone),
            to: utc_to_local_time(end, self.timezone),
            minutes: (end - segment.start_at).num_minutes().max(0),
            notes: segment.notes.clone(),
        }
    }
}
