// Per-property serialization of the check-then-insert booking path

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Entries past this count are pruned when nobody holds them
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per property id
///
/// Two creates for the same property never run their availability check and
/// insert concurrently inside this process. Different properties do not
/// contend.
#[derive(Clone, Default)]
pub struct PropertyLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl PropertyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `property_id`; released when the guard drops
    pub async fn acquire(&self, property_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if map.len() > PRUNE_THRESHOLD {
                // Only the map itself references an idle lock
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            map.entry(property_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }
}
