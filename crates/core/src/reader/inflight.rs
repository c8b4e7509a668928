//! Per-key in-flight download locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::Mutex as AsyncMutex;

use crate::cache::CacheKey;

/// Hands out one async lock per cache key.
///
/// The map only holds weak references; a slot disappears once the last
/// caller holding it finishes.
#[derive(Debug, Default)]
pub(crate) struct InflightRegistry {
    slots: Mutex<HashMap<CacheKey, Weak<AsyncMutex<()>>>>,
}

impl InflightRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The lock for `key`, shared with every concurrent caller for that key.
    pub(crate) fn slot(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| slot.strong_count() > 0);

        if let Some(slot) = slots.get(key).and_then(Weak::upgrade) {
            return slot;
        }

        let slot = Arc::new(AsyncMutex::new(()));
        slots.insert(key.clone(), Arc::downgrade(&slot));
        slot
    }

    /// Number of keys with a live slot.
    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}
