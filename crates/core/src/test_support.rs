//! In-memory collaborators and fixtures for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, TimeZone, Utc};

use crate::audit::{AuditEvent, AuditSink};
use crate::error::{CoreError, CoreResult};
use crate::registry::{RegistryCache, RegistrySnapshot, DEFAULT_REGISTRY_TTL};
use crate::roles::{Actor, ROLE_ADMIN, ROLE_AGENT, ROLE_REQUESTER};
use crate::store::{
    NewSegment, OfficeHours, OfficeLocation, PresenceSegment, PresenceStatus, PresenceStore,
    RegistrySource, SegmentWrite, StaffMember,
};
use crate::types::{DbId, Timestamp};
use crate::validation::SegmentInput;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn status(id: DbId, code: &str, label: &str, requires_office: bool, active: bool) -> PresenceStatus {
    PresenceStatus {
        id,
        code: code.into(),
        label: label.into(),
        requires_office,
        is_active: active,
    }
}

pub fn office(id: DbId, code: &str, name: &str, active: bool) -> OfficeLocation {
    OfficeLocation {
        id,
        code: code.into(),
        name: name.into(),
        is_active: active,
    }
}

pub const AVAILABLE: DbId = 1;
pub const IN_OFFICE: DbId = 2;
pub const WORKING_REMOTE: DbId = 3;
pub const REMOTE: DbId = 4;
pub const VACATION: DbId = 5;
pub const SICK: DbId = 6;
pub const MEETING: DbId = 7;
pub const NEWPORT: DbId = 1;
pub const IRVINE: DbId = 2;

pub fn seeded_statuses() -> Vec<PresenceStatus> {
    vec![
        status(AVAILABLE, "AVAILABLE", "Available", true, true),
        status(IN_OFFICE, "IN_OFFICE", "In Office", true, true),
        status(WORKING_REMOTE, "WORKING_REMOTE", "Working Remote", false, true),
        status(REMOTE, "REMOTE", "Remote", false, true),
        status(VACATION, "VACATION", "Vacation", false, true),
        status(SICK, "SICK", "Sick", false, true),
        status(MEETING, "MEETING", "In a Meeting", false, true),
    ]
}

pub fn seeded_offices() -> Vec<OfficeLocation> {
    vec![
        office(NEWPORT, "NEWPORT_BEACH", "Newport", true),
        office(IRVINE, "IRVINE", "Irvine", true),
    ]
}

pub fn seeded_snapshot() -> RegistrySnapshot {
    RegistrySnapshot::new(seeded_statuses(), seeded_offices())
}

pub fn input(status: &str, office: Option<&str>, from: &str, to: &str) -> SegmentInput {
    SegmentInput {
        status_code: status.into(),
        office_code: office.map(Into::into),
        from: from.into(),
        to: to.into(),
        notes: None,
    }
}

pub fn agent(id: DbId) -> Actor {
    Actor::new(id, format!("agent{id}@example.com"), [ROLE_AGENT])
}

pub fn admin(id: DbId) -> Actor {
    Actor::new(id, format!("admin{id}@example.com"), [ROLE_ADMIN])
}

pub fn requester(id: DbId) -> Actor {
    Actor::new(id, format!("requester{id}@example.com"), [ROLE_REQUESTER])
}

pub fn hours(user_id: DbId, day_of_week: i16, start: &str, end: &str) -> OfficeHours {
    OfficeHours {
        id: 0,
        user_id,
        day_of_week,
        start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
        end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
    }
}

/// Weekday office hours, Monday through Friday.
pub fn weekday_hours(user_id: DbId, start: &str, end: &str) -> Vec<OfficeHours> {
    (1..=5).map(|d| hours(user_id, d, start, end)).collect()
}

pub fn staff(id: DbId, name: &str, default_location: Option<&str>) -> StaffMember {
    StaffMember {
        id,
        email: format!("{}@example.com", name.to_lowercase()),
        display_name: name.into(),
        default_location: default_location.map(Into::into),
    }
}

fn epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Registry source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticRegistry {
    statuses: Mutex<Vec<PresenceStatus>>,
    offices: Mutex<Vec<OfficeLocation>>,
    fetches: AtomicUsize,
    fail_next: AtomicBool,
}

impl StaticRegistry {
    pub fn seeded() -> Self {
        Self {
            statuses: Mutex::new(seeded_statuses()),
            offices: Mutex::new(seeded_offices()),
            ..Default::default()
        }
    }

    pub fn push_status(&self, status: PresenceStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    pub fn push_office(&self, office: OfficeLocation) {
        self.offices.lock().unwrap().push(office);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail_next_fetch(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn fetch_statuses(&self) -> CoreResult<Vec<PresenceStatus>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CoreError::storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "registry unavailable",
            )));
        }
        Ok(self.statuses.lock().unwrap().clone())
    }

    async fn fetch_offices(&self) -> CoreResult<Vec<OfficeLocation>> {
        Ok(self.offices.lock().unwrap().clone())
    }
}

pub fn seeded_cache() -> Arc<RegistryCache> {
    Arc::new(RegistryCache::new(
        Arc::new(StaticRegistry::seeded()),
        DEFAULT_REGISTRY_TTL,
    ))
}

// ---------------------------------------------------------------------------
// Presence store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    segments: Vec<PresenceSegment>,
    next_id: DbId,
    hours: Vec<OfficeHours>,
    staff: Vec<StaffMember>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_staff(staff: Vec<StaffMember>, hours: Vec<OfficeHours>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            state.staff = staff;
            state.hours = hours;
        }
        store
    }

    /// Insert a stored segment directly; later seeds are created later.
    pub fn seed_segment(
        &self,
        user_id: DbId,
        status_id: DbId,
        office_location_id: Option<DbId>,
        start_at: Timestamp,
        end_at: Option<Timestamp>,
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.segments.push(PresenceSegment {
            id,
            user_id,
            status_id,
            office_location_id,
            start_at,
            end_at,
            notes: None,
            is_active: true,
            created_at: epoch() + Duration::seconds(id),
        });
        id
    }

    pub fn segments(&self) -> Vec<PresenceSegment> {
        self.state.lock().unwrap().segments.clone()
    }

    pub fn active_segments_of(&self, user_id: DbId) -> Vec<PresenceSegment> {
        self.segments()
            .into_iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .collect()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn insert(state: &mut StoreState, new: &NewSegment) -> DbId {
        state.next_id += 1;
        let id = state.next_id;
        state.segments.push(PresenceSegment {
            id,
            user_id: new.user_id,
            status_id: new.status_id,
            office_location_id: new.office_location_id,
            start_at: new.start_at,
            end_at: Some(new.end_at),
            notes: new.notes.clone(),
            is_active: true,
            created_at: epoch() + Duration::seconds(id),
        });
        id
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn segments_starting_in(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>> {
        Ok(self
            .active_segments_of(user_id)
            .into_iter()
            .filter(|s| s.start_at >= start && s.start_at < end)
            .collect())
    }

    async fn segments_overlapping(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>> {
        Ok(self
            .active_segments_of(user_id)
            .into_iter()
            .filter(|s| s.intersects(start, end))
            .collect())
    }

    async fn segments_active_at(&self, at: Timestamp) -> CoreResult<Vec<PresenceSegment>> {
        Ok(self
            .segments()
            .into_iter()
            .filter(|s| s.is_active && s.contains(at))
            .collect())
    }

    async fn find_segment(&self, id: DbId) -> CoreResult<Option<PresenceSegment>> {
        Ok(self.segments().into_iter().find(|s| s.id == id))
    }

    async fn apply_day_plan(&self, user_id: DbId, writes: &[SegmentWrite]) -> CoreResult<Vec<DbId>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::storage(std::io::Error::new(
                std::io::ErrorKind::Other,
                "write failed",
            )));
        }
        let mut state = self.state.lock().unwrap();
        let mut ids = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                SegmentWrite::Extend {
                    id,
                    start_at,
                    end_at,
                    notes,
                } => {
                    let seg = state
                        .segments
                        .iter_mut()
                        .find(|s| s.id == *id && s.user_id == user_id)
                        .ok_or(CoreError::NotFound {
                            entity: "staff_presence",
                            id: *id,
                        })?;
                    seg.start_at = *start_at;
                    seg.end_at = Some(*end_at);
                    if notes.is_some() {
                        seg.notes = notes.clone();
                    }
                    ids.push(*id);
                }
                SegmentWrite::Create(new) => ids.push(Self::insert(&mut state, new)),
            }
        }
        Ok(ids)
    }

    async fn deactivate_segment(&self, id: DbId) -> CoreResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.segments.iter_mut().find(|s| s.id == id && s.is_active) {
            Some(seg) => {
                seg.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn office_hours(&self, user_ids: &[DbId]) -> CoreResult<Vec<OfficeHours>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .hours
            .iter()
            .filter(|h| user_ids.contains(&h.user_id))
            .cloned()
            .collect())
    }

    async fn roster(&self) -> CoreResult<Vec<StaffMember>> {
        Ok(self.state.lock().unwrap().staff.clone())
    }

    async fn staff_member(&self, id: DbId) -> CoreResult<Option<StaffMember>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .staff
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Audit sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAudit {
    fn log_event(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
