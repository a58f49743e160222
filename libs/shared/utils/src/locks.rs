use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Registry of per-professional booking locks. Holding a professional's
/// guard serializes check-then-write booking sequences against that
/// professional inside this process only.
#[derive(Default)]
pub struct SlotLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, professional: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(professional.to_string()).or_default())
        };

        debug!("Waiting for booking lock on {}", professional);
        lock.lock_owned().await
    }
}

/// Acquires the professional's guard when serialization is enabled.
pub async fn guard_for(
    locks: Option<&Arc<SlotLocks>>,
    professional: &str,
) -> Option<OwnedMutexGuard<()>> {
    match locks {
        Some(locks) => Some(locks.acquire(professional).await),
        None => None,
    }
}
