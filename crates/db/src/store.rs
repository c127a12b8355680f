//! Postgres-backed implementation of the scheduling core's persistence seams.

use async_trait::async_trait;
use sqlx::PgPool;
use staffboard_core::error::{CoreError, CoreResult};
use staffboard_core::store::{
    OfficeHours, OfficeLocation, PresenceSegment, PresenceStatus, PresenceStore, RegistrySource,
    SegmentWrite, StaffMember,
};
use staffboard_core::types::{DbId, Timestamp};

use crate::repositories::{
    OfficeHoursRepo, OfficeLocationRepo, PresenceSegmentRepo, PresenceStatusRepo, StaffRepo,
};

/// Adapts the repositories to [`PresenceStore`] and [`RegistrySource`].
/// Cloning is cheap; the pool is reference-counted.
#[derive(Clone)]
pub struct PgPresenceStore {
    pool: PgPool,
}

impl PgPresenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_all<R, T: From<R>>(rows: Vec<R>) -> Vec<T> {
    rows.into_iter().map(T::from).collect()
}

#[async_trait]
impl PresenceStore for PgPresenceStore {
    async fn segments_starting_in(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>> {
        let rows = PresenceSegmentRepo::list_starting_in(&self.pool, user_id, start, end)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn segments_overlapping(
        &self,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> CoreResult<Vec<PresenceSegment>> {
        let rows = PresenceSegmentRepo::list_overlapping(&self.pool, user_id, start, end)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn segments_active_at(&self, at: Timestamp) -> CoreResult<Vec<PresenceSegment>> {
        let rows = PresenceSegmentRepo::list_active_at(&self.pool, at)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn find_segment(&self, id: DbId) -> CoreResult<Option<PresenceSegment>> {
        let row = PresenceSegmentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(Into::into))
    }

    async fn apply_day_plan(&self, user_id: DbId, writes: &[SegmentWrite]) -> CoreResult<Vec<DbId>> {
        let ids = PresenceSegmentRepo::apply_writes(&self.pool, user_id, writes)
            .await
            .map_err(CoreError::storage)?;
        tracing::debug!(user_id, writes = ids.len(), "Day plan written");
        Ok(ids)
    }

    async fn deactivate_segment(&self, id: DbId) -> CoreResult<bool> {
        PresenceSegmentRepo::deactivate(&self.pool, id)
            .await
            .map_err(CoreError::storage)
    }

    async fn office_hours(&self, user_ids: &[DbId]) -> CoreResult<Vec<OfficeHours>> {
        let rows = OfficeHoursRepo::list_for_users(&self.pool, user_ids)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn roster(&self) -> CoreResult<Vec<StaffMember>> {
        let rows = StaffRepo::roster(&self.pool).await.map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn staff_member(&self, id: DbId) -> CoreResult<Option<StaffMember>> {
        let row = StaffRepo::find_by_id(&self.pool, id)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl RegistrySource for PgPresenceStore {
    async fn fetch_statuses(&self) -> CoreResult<Vec<PresenceStatus>> {
        let rows = PresenceStatusRepo::list_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }

    async fn fetch_offices(&self) -> CoreResult<Vec<OfficeLocation>> {
        let rows = OfficeLocationRepo::list_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(into_all(rows))
    }
}
