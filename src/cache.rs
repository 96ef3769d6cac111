//! Memoised resolutions, one per settings type.
//!
//! A [`ResolveCache`] is owned by the caller (often a `static`). The first
//! request for a type runs its resolution; every later request for the same
//! type, from any thread, gets the same `Arc`. Concurrent first requests block
//! until the single resolution in flight has finished.
//!
//! The cache is keyed by type alone, so the stage order of the first request
//! decides the cached value and later orders are ignored.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

type Slot = Arc<OnceLock<Arc<dyn Any + Send + Sync>>>;

pub struct ResolveCache {
    slots: Mutex<Vec<(TypeId, Slot)>>,
}

impl ResolveCache {
    pub const fn new() -> Self {
        Self {
            slots: parking_lot::const_mutex(Vec::new()),
        }
    }

    /// The cached `S`, running `init` if this is the first request for `S`.
    pub fn get_or_init<S, F>(&self, init: F) -> Arc<S>
    where
        S: Send + Sync + 'static,
        F: FnOnce() -> S,
    {
        let slot = self.slot(TypeId::of::<S>());
        let value = slot
            .get_or_init(|| {
                tracing::debug!(settings = std::any::type_name::<S>(), "first resolution, caching");
                Arc::new(init()) as Arc<dyn Any + Send + Sync>
            })
            .clone();
        match value.downcast::<S>() {
            Ok(settings) => settings,
            Err(_) => unreachable!("cache slots are keyed by TypeId"),
        }
    }

    /// The cached `S`, if it has been resolved.
    pub fn get<S: Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        let slots = self.slots.lock();
        let (_, slot) = slots.iter().find(|(id, _)| *id == TypeId::of::<S>())?;
        slot.get().cloned()?.downcast::<S>().ok()
    }

    pub fn contains<S: 'static>(&self) -> bool {
        let slots = self.slots.lock();
        slots
            .iter()
            .any(|(id, slot)| *id == TypeId::of::<S>() && slot.get().is_some())
    }

    /// Number of resolved types.
    pub fn len(&self) -> usize {
        self.slots.lock().iter().filter(|(_, s)| s.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The lock only guards the slot list; initialisation happens outside it so
    // resolving one type never blocks requests for another.
    fn slot(&self, id: TypeId) -> Slot {
        let mut slots = self.slots.lock();
        if let Some((_, slot)) = slots.iter().find(|(existing, _)| *existing == id) {
            return slot.clone();
        }
        let slot = Slot::default();
        slots.push((id, slot.clone()));
        slot
    }
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolveCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveCache")
            .field("resolved", &self.len())
            .finish()
    }
}
