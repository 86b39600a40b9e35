//! Process-wide identity cache: a weak-keyed map from source interface to its
//! resolved descriptor, plus the canonical interning set for parameter
//! descriptors. Both stores share one reentrant monitor so that `examine` can
//! recurse into itself (for self- and mutually-referential interfaces) on the
//! same thread without deadlocking, while still serializing unrelated callers.

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use crate::model::SourceInterface;
use crate::structs::loaded::interface::InterfaceCell;
use crate::structs::loaded::{InterfaceDescriptor, ParameterDescriptor};

struct WeakKey(Weak<SourceInterface>);

impl PartialEq for WeakKey {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for WeakKey {}

impl Hash for WeakKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
    }
}

#[derive(Default)]
struct CacheInner {
    interfaces: Vec<(WeakKey, Arc<InterfaceCell>)>,
    interned_parameters: HashSet<ParameterDescriptor>,
}

impl CacheInner {
    /// Drops entries whose source interface has been dropped, then returns the
    /// live entry matching `source`, if any. Weak-keyed, so this is how the
    /// cache lets an unreferenced interface's metadata become collectible.
    fn find_live(&mut self, source: &Arc<SourceInterface>) -> Option<Arc<InterfaceCell>> {
        self.interfaces.retain(|(key, _)| key.0.upgrade().is_some());
        self.interfaces
            .iter()
            .find(|(key, _)| key.0.upgrade().map(|s| Arc::ptr_eq(&s, source)).unwrap_or(false))
            .map(|(_, cell)| cell.clone())
    }
}

pub struct IdentityCache {
    monitor: ReentrantMutex<RefCell<CacheInner>>,
    validations_performed: AtomicU64,
    cache_hits: AtomicU64,
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self {
            monitor: ReentrantMutex::new(RefCell::new(CacheInner::default())),
            validations_performed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// The single cache-wide monitor. `examine` holds this for the duration of
    /// validate-merge-publish-resolve; same-thread reentry (for recursive
    /// `examine` calls during resolve) is permitted by construction.
    pub(crate) fn lock(&self) -> parking_lot::ReentrantMutexGuard<'_, RefCell<CacheInner>> {
        self.monitor.lock()
    }

    pub fn get_interface(&self, source: &Arc<SourceInterface>) -> Option<InterfaceDescriptor> {
        let guard = self.monitor.lock();
        let found = guard.borrow_mut().find_live(source);
        found.map(InterfaceDescriptor)
    }

    pub(crate) fn put_interface(&self, source: &Arc<SourceInterface>, cell: Arc<InterfaceCell>) {
        let guard = self.monitor.lock();
        guard
            .borrow_mut()
            .interfaces
            .push((WeakKey(Arc::downgrade(source)), cell));
    }

    pub(crate) fn remove_interface(&self, source: &Arc<SourceInterface>) {
        let guard = self.monitor.lock();
        let mut inner = guard.borrow_mut();
        inner
            .interfaces
            .retain(|(key, _)| key.0.upgrade().map(|s| !Arc::ptr_eq(&s, source)).unwrap_or(true));
    }

    pub fn intern_parameter(&self, candidate: ParameterDescriptor) -> ParameterDescriptor {
        let guard = self.monitor.lock();
        let mut inner = guard.borrow_mut();
        if let Some(existing) = inner.interned_parameters.get(&candidate) {
            trace!("parameter descriptor already canonical");
            return existing.clone();
        }
        inner.interned_parameters.insert(candidate.clone());
        candidate
    }

    pub(crate) fn record_validation(&self) {
        self.validations_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        debug!("identity cache hit");
    }

    /// Number of times `examine` has run full validation (as opposed to
    /// returning a cached descriptor). Exposed so callers/tests can observe
    /// the "validate at most once per interface per cache lifetime" invariant.
    pub fn validation_count(&self) -> u64 {
        self.validations_performed.load(Ordering::Relaxed)
    }

    pub fn cache_hit_count(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn interned_parameter_count(&self) -> usize {
        let guard = self.monitor.lock();
        let count = guard.borrow().interned_parameters.len();
        count
    }
}
