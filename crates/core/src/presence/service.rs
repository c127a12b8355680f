//! Read-side presence operations over the store and registry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::resolve::{is_after_hours, label_segments, pick_current, resolve_at_instant, ResolvedStatus};
use super::week::{week_view, WeekDay, WEEK_VIEW_DAYS};
use crate::config::PresenceConfig;
use crate::error::{CoreError, CoreResult};
use crate::registry::RegistryCache;
use crate::roles::{can_view_schedule, is_requester_role, Actor};
use crate::store::{OfficeHours, PresenceStore, StaffMember};
use crate::timezone::{local_date, local_day_window};
use crate::types::{DbId, Timestamp};

/// Location shown for default office hours when a user has none configured.
pub const FALLBACK_LOCATION: &str = "Office";

/// One row of the "who is where right now" board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPresence {
    pub user_id: DbId,
    pub display_name: String,
    pub email: String,
    pub segment_id: DbId,
    pub presence: ResolvedStatus,
    pub since: Timestamp,
    pub until: Option<Timestamp>,
    pub is_after_hours: bool,
}

pub struct PresenceService {
    store: Arc<dyn PresenceStore>,
    registry: Arc<RegistryCache>,
    timezone: Tz,
}

fn authorize_read(actor: Option<&Actor>, user_id: Option<DbId>) -> CoreResult<&Actor> {
    let actor = actor.ok_or_else(|| CoreError::Unauthorized("No authenticated actor".into()))?;
    let allowed = match user_id {
        Some(id) => can_view_schedule(actor, id),
        None => !is_requester_role(actor),
    };
    if !allowed {
        return Err(CoreError::Forbidden("Presence is visible to staff only".into()));
    }
    Ok(actor)
}

impl PresenceService {
    pub fn new(store: Arc<dyn PresenceStore>, registry: Arc<RegistryCache>, config: &PresenceConfig) -> Self {
        Self {
            store,
            registry,
            timezone: config.timezone,
        }
    }

    /// At most one effective presence per roster member at `now`. Members
    /// with no active segment are left out.
    pub async fn current_presences(&self, actor: Option<&Actor>, now: Timestamp) -> CoreResult<Vec<CurrentPresence>> {
        authorize_read(actor, None)?;

        let roster = self.store.roster().await?;
        let user_ids: Vec<DbId> = roster.iter().map(|m| m.id).collect();
        let (segments, hours) = tokio::try_join!(
            self.store.segments_active_at(now),
            self.store.office_hours(&user_ids),
        )?;
        let registry = self.registry.snapshot().await?;

        let mut by_user: HashMap<DbId, Vec<_>> = HashMap::new();
        for seg in label_segments(segments, &registry) {
            by_user.entry(seg.segment.user_id).or_default().push(seg);
        }
        let mut hours_by_user: HashMap<DbId, Vec<OfficeHours>> = HashMap::new();
        for h in hours {
            hours_by_user.entry(h.user_id).or_default().push(h);
        }

        let presences: Vec<CurrentPresence> = roster
            .into_iter()
            .filter_map(|member| {
                let current = pick_current(by_user.get(&member.id)?)?;
                let member_hours = hours_by_user.get(&member.id).map_or(&[][..], Vec::as_slice);
                Some(CurrentPresence {
                    user_id: member.id,
                    display_name: member.display_name,
                    email: member.email,
                    segment_id: current.segment.id,
                    presence: current.to_resolved(),
                    since: current.segment.start_at,
                    until: current.segment.end_at,
                    is_after_hours: is_after_hours(now, self.timezone, member_hours),
                })
            })
            .collect();

        tracing::debug!(
            roster = user_ids.len(),
            present = presences.len(),
            "Current presences resolved"
        );
        Ok(presences)
    }

    async fn member(&self, user_id: DbId) -> CoreResult<StaffMember> {
        self.store
            .staff_member(user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "user", id: user_id })
    }

    /// Resolve one user's presence at `at`.
    pub async fn resolve_user_at(
        &self,
        actor: Option<&Actor>,
        user_id: DbId,
        at: Timestamp,
    ) -> CoreResult<ResolvedStatus> {
        authorize_read(actor, Some(user_id))?;
        let member = self.member(user_id).await?;

        let (day_start, day_end) = local_day_window(local_date(at, self.timezone), self.timezone);
        let (segments, hours) = tokio::try_join!(
            self.store.segments_overlapping(user_id, day_start, day_end),
            self.store.office_hours(std::slice::from_ref(&user_id)),
        )?;
        let registry = self.registry.snapshot().await?;
        let labelled = label_segments(segments, &registry);

        Ok(resolve_at_instant(
            at,
            self.timezone,
            &labelled,
            &hours,
            member.default_location.as_deref().unwrap_or(FALLBACK_LOCATION),
        ))
    }

    /// Seven rolling days from the local date of `now`. Defaults to the actor.
    pub async fn week_view(
        &self,
        actor: Option<&Actor>,
        user_id: Option<DbId>,
        now: Timestamp,
    ) -> CoreResult<Vec<WeekDay>> {
        let actor = authorize_read(actor, user_id)?;
        let user_id = user_id.unwrap_or(actor.id);
        let member = self.member(user_id).await?;

        let today = local_date(now, self.timezone);
        let (start, _) = local_day_window(today, self.timezone);
        let last = today + Duration::days(WEEK_VIEW_DAYS - 1);
        let (_, end) = local_day_window(last, self.timezone);

        let (segments, hours) = tokio::try_join!(
            self.store.segments_overlapping(user_id, start, end),
            self.store.office_hours(std::slice::from_ref(&user_id)),
        )?;
        let registry = self.registry.snapshot().await?;
        let labelled = label_segments(segments, &registry);

        Ok(week_view(
            today,
            self.timezone,
            &labelled,
            &hours,
            member.default_location.as_deref().unwrap_or(FALLBACK_LOCATION),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::presence::resolve::PresenceKind;
    use crate::test_support::{
        agent, requester, seeded_cache, staff, weekday_hours, MemoryStore, AVAILABLE, MEETING, NEWPORT,
        VACATION, WORKING_REMOTE,
    };
    use crate::timezone::local_to_utc;

    const TZ: Tz = chrono_tz::America::Los_Angeles;

    fn at(day: u32, time: &str) -> Timestamp {
        local_to_utc(
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            TZ,
        )
    }

    fn service() -> (Arc<MemoryStore>, PresenceService) {
        let mut hours = weekday_hours(1, "09:00", "17:00");
        hours.extend(weekday_hours(2, "09:00", "17:00"));
        let store = Arc::new(MemoryStore::with_staff(
            vec![
                staff(1, "Ada", Some("Newport")),
                staff(2, "Grace", None),
                staff(3, "Linus", None),
            ],
            hours,
        ));
        let service = PresenceService::new(store.clone(), seeded_cache(), &PresenceConfig::default());
        (store, service)
    }

    // -----------------------------------------------------------------------
    // Current snapshot
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn one_presence_per_user_by_priority_then_recency() {
        let (store, service) = service();
        store.seed_segment(1, AVAILABLE, Some(NEWPORT), at(6, "09:00"), Some(at(6, "17:00")));
        store.seed_segment(1, VACATION, None, at(6, "00:00"), None);
        store.seed_segment(2, MEETING, None, at(6, "09:00"), Some(at(6, "11:00")));
        store.seed_segment(2, WORKING_REMOTE, None, at(6, "08:00"), Some(at(6, "12:00")));
        store.seed_segment(2, AVAILABLE, Some(NEWPORT), at(6, "08:00"), Some(at(6, "12:00")));

        let board = service.current_presences(Some(&agent(1)), at(6, "10:00")).await.unwrap();

        assert_eq!(board.len(), 2, "Linus has no active segment");
        assert_eq!(board[0].presence.status, "Out of Office - Vacation");
        assert_eq!(board[0].presence.kind, PresenceKind::TimeOff);
        // Same priority for Grace's schedule rows: the later one wins.
        assert_eq!(board[1].presence.status, "Available - Newport");
        assert_eq!(board[1].presence.priority, 2);
    }

    #[tokio::test]
    async fn after_hours_flag_uses_todays_window() {
        let (store, service) = service();
        store.seed_segment(1, WORKING_REMOTE, None, at(6, "06:00"), None);

        let early = service.current_presences(Some(&agent(1)), at(6, "07:00")).await.unwrap();
        assert!(early[0].is_after_hours);
        let midday = service.current_presences(Some(&agent(1)), at(6, "12:00")).await.unwrap();
        assert!(!midday[0].is_after_hours);
        // Saturday has no window at all.
        let saturday = service.current_presences(Some(&agent(1)), at(11, "12:00")).await.unwrap();
        assert!(saturday[0].is_after_hours);
    }

    #[tokio::test]
    async fn deactivated_segments_are_ignored() {
        let (store, service) = service();
        let id = store.seed_segment(1, VACATION, None, at(6, "00:00"), None);
        store.deactivate_segment(id).await.unwrap();
        let board = service.current_presences(Some(&agent(1)), at(6, "10:00")).await.unwrap();
        assert!(board.is_empty());
    }

    #[tokio::test]
    async fn requesters_and_anonymous_callers_rejected() {
        let (_, service) = service();
        assert_matches!(
            service.current_presences(None, at(6, "10:00")).await,
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            service.current_presences(Some(&requester(9)), at(6, "10:00")).await,
            Err(CoreError::Forbidden(_))
        );
    }

    // -----------------------------------------------------------------------
    // Single user
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn resolve_user_uses_default_location() {
        let (_, service) = service();
        let resolved = service.resolve_user_at(Some(&agent(2)), 1, at(6, "10:00")).await.unwrap();
        assert_eq!(resolved.status, "Default: Newport");

        let resolved = service.resolve_user_at(Some(&agent(1)), 2, at(6, "10:00")).await.unwrap();
        assert_eq!(resolved.status, "Default: Office");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (_, service) = service();
        assert_matches!(
            service.resolve_user_at(Some(&agent(1)), 99, at(6, "10:00")).await,
            Err(CoreError::NotFound { entity: "user", id: 99 })
        );
    }

    #[tokio::test]
    async fn week_view_defaults_to_actor() {
        let (store, service) = service();
        store.seed_segment(1, AVAILABLE, Some(NEWPORT), at(7, "10:00"), Some(at(7, "12:00")));

        let week = service.week_view(Some(&agent(1)), None, at(6, "08:00")).await.unwrap();
        assert_eq!(week.len(), 5);
        assert_eq!(week[0].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(week[1].entries.len(), 3);
        assert_eq!(week[1].entries[1].status, "Available - Newport");
    }
}
