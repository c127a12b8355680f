//! Cached lookup of presence statuses and office locations by code.
//!
//! One [`RegistryCache`] is created at startup and shared via `Arc`. Entries
//! live for a short TTL; [`RegistryCache::invalidate`] forces the next call
//! to re-fetch (after admin edits, or in tests that mutate then assert).
//!
//! A refresh fetches both tables completely before swapping the snapshot in,
//! so readers only ever see a whole old snapshot or a whole new one.
//! Concurrent refreshes may both fetch; the last one to finish wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::CoreResult;
use crate::store::{OfficeLocation, PresenceStatus, RegistrySource};
use crate::types::DbId;

/// Default time-to-live for a fetched snapshot.
pub const DEFAULT_REGISTRY_TTL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable copy of the registry tables.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    statuses: HashMap<DbId, PresenceStatus>,
    status_codes: HashMap<String, DbId>,
    offices: HashMap<DbId, OfficeLocation>,
    office_codes: HashMap<String, DbId>,
}

impl RegistrySnapshot {
    pub fn new(statuses: Vec<PresenceStatus>, offices: Vec<OfficeLocation>) -> Self {
        let status_codes = statuses.iter().map(|s| (s.code.clone(), s.id)).collect();
        let office_codes = offices.iter().map(|o| (o.code.clone(), o.id)).collect();
        Self {
            statuses: statuses.into_iter().map(|s| (s.id, s)).collect(),
            status_codes,
            offices: offices.into_iter().map(|o| (o.id, o)).collect(),
            office_codes,
        }
    }

    /// The active status with this code. Unknown and inactive codes yield
    /// `None`: such statuses cannot be used for new segments.
    pub fn resolve_status(&self, code: &str) -> Option<&PresenceStatus> {
        self.status_codes
            .get(code)
            .and_then(|id| self.statuses.get(id))
            .filter(|s| s.is_active)
    }

    /// The active office with this code, same contract as [`Self::resolve_status`].
    pub fn resolve_office(&self, code: &str) -> Option<&OfficeLocation> {
        self.office_codes
            .get(code)
            .and_then(|id| self.offices.get(id))
            .filter(|o| o.is_active)
    }

    /// Any status by id, inactive included, for labelling historical rows.
    pub fn status_by_id(&self, id: DbId) -> Option<&PresenceStatus> {
        self.statuses.get(&id)
    }

    pub fn office_by_id(&self, id: DbId) -> Option<&OfficeLocation> {
        self.offices.get(&id)
    }

    /// Active statuses ordered by code.
    pub fn active_statuses(&self) -> Vec<PresenceStatus> {
        let mut out: Vec<_> = self.statuses.values().filter(|s| s.is_active).cloned().collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    /// Active offices ordered by code.
    pub fn active_offices(&self) -> Vec<OfficeLocation> {
        let mut out: Vec<_> = self.offices.values().filter(|o| o.is_active).cloned().collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct Loaded {
    fetched_at: Instant,
    snapshot: Arc<RegistrySnapshot>,
}

pub struct RegistryCache {
    source: Arc<dyn RegistrySource>,
    ttl: Duration,
    loaded: RwLock<Option<Loaded>>,
}

impl RegistryCache {
    pub fn new(source: Arc<dyn RegistrySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            loaded: RwLock::new(None),
        }
    }

    /// Return the current snapshot, fetching a fresh one if the cached copy
    /// is missing or older than the TTL.
    pub async fn snapshot(&self) -> CoreResult<Arc<RegistrySnapshot>> {
        if let Some(loaded) = self.loaded.read().await.as_ref() {
            if loaded.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&loaded.snapshot));
            }
        }
        self.refresh().await
    }

    async fn refresh(&self) -> CoreResult<Arc<RegistrySnapshot>> {
        let (statuses, offices) =
            tokio::try_join!(self.source.fetch_statuses(), self.source.fetch_offices())?;
        let snapshot = Arc::new(RegistrySnapshot::new(statuses, offices));
        tracing::debug!(
            statuses = snapshot.statuses.len(),
            offices = snapshot.offices.len(),
            "Registry snapshot refreshed"
        );

        *self.loaded.write().await = Some(Loaded {
            fetched_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    /// Drop the cached snapshot so the next lookup re-fetches.
    pub async fn invalidate(&self) {
        *self.loaded.write().await = None;
        tracing::debug!("Registry cache invalidated");
    }

    pub async fn resolve_status(&self, code: &str) -> CoreResult<Option<PresenceStatus>> {
        Ok(self.snapshot().await?.resolve_status(code).cloned())
    }

    pub async fn resolve_office(&self, code: &str) -> CoreResult<Option<OfficeLocation>> {
        Ok(self.snapshot().await?.resolve_office(code).cloned())
    }

    pub async fn active_statuses(&self) -> CoreResult<Vec<PresenceStatus>> {
        Ok(self.snapshot().await?.active_statuses())
    }

    pub async fn active_offices(&self) -> CoreResult<Vec<OfficeLocation>> {
        Ok(self.snapshot().await?.active_offices())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;
    use crate::test_support::{office, status, StaticRegistry};

    fn cache(source: &Arc<StaticRegistry>) -> RegistryCache {
        RegistryCache::new(source.clone(), DEFAULT_REGISTRY_TTL)
    }

    // -----------------------------------------------------------------------
    // Resolution contract
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn resolves_active_codes() {
        let source = Arc::new(StaticRegistry::seeded());
        let cache = cache(&source);
        let available = cache.resolve_status("AVAILABLE").await.unwrap().unwrap();
        assert!(available.requires_office);
        assert!(cache.resolve_office("NEWPORT_BEACH").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_and_inactive_codes_are_none() {
        let source = Arc::new(StaticRegistry::seeded());
        source.push_status(status(50, "LEGACY_LUNCH", "Lunch", false, false));
        let cache = cache(&source);
        assert!(cache.resolve_status("NOPE").await.unwrap().is_none());
        assert!(cache.resolve_status("LEGACY_LUNCH").await.unwrap().is_none());

        // Still labelled for historical rows.
        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.status_by_id(50).unwrap().label, "Lunch");
    }

    #[tokio::test]
    async fn active_listing_is_sorted_and_filtered() {
        let source = Arc::new(StaticRegistry::seeded());
        source.push_office(office(9, "CLOSED_SITE", "Closed", false));
        let cache = cache(&source);
        let offices = cache.active_offices().await.unwrap();
        assert!(offices.iter().all(|o| o.is_active));
        assert!(offices.windows(2).all(|w| w[0].code <= w[1].code));
    }

    // -----------------------------------------------------------------------
    // Caching
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_lookup_within_ttl_hits_cache() {
        let source = Arc::new(StaticRegistry::seeded());
        let cache = cache(&source);
        cache.resolve_status("AVAILABLE").await.unwrap();
        cache.resolve_office("NEWPORT_BEACH").await.unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_snapshot_is_refetched() {
        let source = Arc::new(StaticRegistry::seeded());
        let cache = cache(&source);
        cache.snapshot().await.unwrap();
        tokio::time::advance(DEFAULT_REGISTRY_TTL + Duration::from_secs(1)).await;
        cache.snapshot().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_exposes_admin_edits_immediately() {
        let source = Arc::new(StaticRegistry::seeded());
        let cache = cache(&source);
        assert!(cache.resolve_status("TRAINING").await.unwrap().is_none());

        source.push_status(status(60, "TRAINING", "Training", false, true));
        assert!(cache.resolve_status("TRAINING").await.unwrap().is_none());

        cache.invalidate().await;
        assert!(cache.resolve_status("TRAINING").await.unwrap().is_some());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_previous_snapshot() {
        let source = Arc::new(StaticRegistry::seeded());
        let cache = RegistryCache::new(source.clone(), Duration::ZERO);
        let first = cache.snapshot().await.unwrap();

        source.fail_next_fetch();
        assert_matches!(cache.snapshot().await, Err(CoreError::Storage(_)));

        let guard = cache.loaded.read().await;
        let kept = guard.as_ref().unwrap();
        assert!(Arc::ptr_eq(&kept.snapshot, &first));
    }
}
