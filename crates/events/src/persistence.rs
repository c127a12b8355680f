//! Durable audit persistence.
//!
//! [`AuditPersistence`] subscribes to the [`AuditBus`](crate::bus::AuditBus)
//! and writes every received event to `audit_logs` with its payload
//! redacted. It runs as a background task and stops when the bus is dropped.
//! Write failures are logged and skipped; they never reach the code that
//! emitted the event.

use async_trait::async_trait;
use staffboard_core::audit::AuditEvent;
use staffboard_core::types::DbId;
use staffboard_db::models::audit::CreateAuditLog;
use staffboard_db::repositories::AuditLogRepo;
use staffboard_db::DbPool;
use tokio::sync::broadcast;

/// Destination for audit rows.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn write(&self, entry: &CreateAuditLog) -> Result<DbId, sqlx::Error>;
}

#[async_trait]
impl AuditWriter for DbPool {
    async fn write(&self, entry: &CreateAuditLog) -> Result<DbId, sqlx::Error> {
        AuditLogRepo::insert(self, entry).await.map(|row| row.id)
    }
}

pub struct AuditPersistence;

impl AuditPersistence {
    /// Persist events from `receiver` into the database until the bus closes.
    pub async fn run(pool: DbPool, receiver: broadcast::Receiver<AuditEvent>) {
        Self::run_with(&pool, receiver).await;
    }

    /// Same loop over any [`AuditWriter`]. Returns the number of rows written.
    pub async fn run_with<W: AuditWriter + ?Sized>(
        writer: &W,
        mut receiver: broadcast::Receiver<AuditEvent>,
    ) -> usize {
        let mut written = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let entry = CreateAuditLog::from(&event);
                    match writer.write(&entry).await {
                        Ok(_) => written += 1,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                action = %event.action,
                                entity_id = ?event.entity_id,
                                "Failed to persist audit event"
                            );
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit persistence lagged, some events were not persisted");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(written, "Audit bus closed, persistence shutting down");
                    break;
                }
            }
        }
        written
    }
}
