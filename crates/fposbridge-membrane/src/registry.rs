//! Handle registry.
//!
//! Two layers: lock-free counters that every tracking mode updates, and an
//! address map of live handles that only hardened mode populates. A release
//! removes the address from the map, so the map never holds more entries
//! than there are outstanding handles.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::{HandleFacts, TemporalState};

/// Metadata for a live tracked handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleMeta {
    /// Address handed across the boundary.
    pub base: usize,
    /// Record length in bytes.
    pub len: usize,
    /// Registry-wide issue sequence number, starting at 1.
    pub generation: u64,
}

/// Snapshot of registry counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub allocations: u64,
    pub releases: u64,
    pub copies: u64,
    pub denials: u64,
    pub allocation_failures: u64,
}

impl BridgeStats {
    /// Handles issued but not yet released, according to the counters.
    #[must_use]
    pub fn outstanding(self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }
}

/// Concurrent registry of issued handles.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    live: RwLock<HashMap<usize, HandleMeta>>,
    next_generation: AtomicU64,
    allocations: AtomicU64,
    releases: AtomicU64,
    copies: AtomicU64,
    denials: AtomicU64,
    allocation_failures: AtomicU64,
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- counters only ------------------------------------------------------

    /// Count an allocation without recording its address.
    pub fn note_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a release without consulting the address map.
    pub fn note_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_copy(&self) {
        self.copies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_denial(&self) {
        self.denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_allocation_failure(&self) {
        self.allocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    // -- address map --------------------------------------------------------

    /// Record a freshly issued handle and count the allocation.
    /// Returns its issue sequence number.
    pub fn register(&self, addr: usize, len: usize) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.write().insert(
            addr,
            HandleMeta {
                base: addr,
                len,
                generation,
            },
        );
        self.note_allocation();
        generation
    }

    /// Forget a live handle and count the release. Returns false if `addr`
    /// was not live, in which case nothing changes.
    pub fn release(&self, addr: usize) -> bool {
        let removed = self.live.write().remove(&addr).is_some();
        if removed {
            self.note_release();
        }
        removed
    }

    #[must_use]
    pub fn lookup(&self, addr: usize) -> Option<HandleMeta> {
        self.live.read().get(&addr).copied()
    }

    /// Number of entries in the address map.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.live.read().len()
    }

    /// Addresses in the address map, sorted.
    #[must_use]
    pub fn live_handles(&self) -> Vec<usize> {
        let mut live: Vec<usize> = self.live.read().keys().copied().collect();
        live.sort_unstable();
        live
    }

    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            copies: self.copies.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            allocation_failures: self.allocation_failures.load(Ordering::Relaxed),
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<HandleRegistry> = OnceLock::new();

/// Process-wide registry used by the exported C symbols.
#[must_use]
pub fn global_registry() -> &'static HandleRegistry {
    GLOBAL_REGISTRY.get_or_init(HandleRegistry::new)
}

/// Classify an address under registry facts.
#[must_use]
pub fn classify(registry: &HandleRegistry, addr: usize) -> HandleFacts {
    if addr == 0 {
        return HandleFacts::unknown(0);
    }
    match registry.lookup(addr) {
        Some(meta) => HandleFacts {
            addr,
            temporal: TemporalState::Valid,
            generation: Some(meta.generation),
        },
        None => HandleFacts::unknown(addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_unknown_when_untracked() {
        let registry = HandleRegistry::new();
        let facts = classify(&registry, 0x1000);
        assert_eq!(facts.temporal, TemporalState::Unknown);
        assert_eq!(facts.generation, None);
    }

    #[test]
    fn classify_null_is_unknown_zero() {
        let registry = HandleRegistry::new();
        registry.register(0x1000, 16);
        assert!(classify(&registry, 0).is_null());
    }

    #[test]
    fn register_then_release_forgets_address() {
        let registry = HandleRegistry::new();
        registry.register(0x2000, 16);
        assert_eq!(classify(&registry, 0x2000).temporal, TemporalState::Valid);
        assert_eq!(registry.tracked_count(), 1);

        assert!(registry.release(0x2000));
        assert_eq!(classify(&registry, 0x2000).temporal, TemporalState::Unknown);
        assert_eq!(registry.lookup(0x2000), None);
        assert_eq!(registry.tracked_count(), 0);

        let stats = registry.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn map_stays_bounded_by_outstanding_handles() {
        let registry = HandleRegistry::new();
        for round in 0..1_000usize {
            let addr = 0x10_000 + round * 32;
            registry.register(addr, 16);
            assert!(registry.release(addr));
        }
        assert_eq!(registry.tracked_count(), 0);
        assert_eq!(registry.stats().outstanding(), 0);
        assert_eq!(registry.stats().allocations, 1_000);
    }

    #[test]
    fn second_release_is_reported() {
        let registry = HandleRegistry::new();
        registry.register(0x3000, 16);
        assert!(registry.release(0x3000));
        assert!(!registry.release(0x3000));
        assert!(!registry.release(0x4000));
        assert_eq!(registry.stats().releases, 1);
    }

    #[test]
    fn reissued_address_gets_new_generation() {
        let registry = HandleRegistry::new();
        let first = registry.register(0x5000, 16);
        registry.release(0x5000);
        let second = registry.register(0x5000, 16);
        assert!(second > first);
        assert_eq!(classify(&registry, 0x5000).generation, Some(second));
    }

    #[test]
    fn counters_alone_leave_map_empty() {
        let registry = HandleRegistry::new();
        registry.note_allocation();
        registry.note_allocation();
        registry.note_release();
        assert_eq!(registry.tracked_count(), 0);
        assert_eq!(registry.stats().outstanding(), 1);
    }

    #[test]
    fn live_handles_sorted() {
        let registry = HandleRegistry::new();
        registry.register(0x9000, 16);
        registry.register(0x7000, 16);
        registry.register(0x8000, 16);
        registry.release(0x8000);
        assert_eq!(registry.live_handles(), vec![0x7000, 0x9000]);
    }
}
