//! Per-terrarium mutation serialization.
//!
//! Concurrent assigns targeting the same terrarium must be linearized
//! so the load-occupants → validate → commit sequence never observes a
//! stale occupant set. One async mutex per terrarium id, created on
//! first use.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct TerrariumLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TerrariumLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one terrarium, holding it until the guard
    /// drops. Distinct terrariums never contend.
    pub async fn acquire(&self, terrarium_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(terrarium_id).or_default())
        };
        lock.lock_owned().await
    }
}
