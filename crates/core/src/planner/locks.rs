//! Per-user serialization of plan-day calls.
//!
//! Two concurrent calls for the same user could both read the same day, both
//! pass the cap check and together exceed it. Holding the user's lock across
//! read, plan and write closes that window within one process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::DbId;

#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<DbId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s schedule.
    pub async fn acquire(&self, user_id: DbId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            Arc::clone(map.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_user_waits() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(1).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2))
            .await
            .expect("user 2 must not wait on user 1");
    }
}
