//! Runtime policy bridge for ABI entrypoints.
//!
//! Pairs a [`BridgeMode`] with the registry it should consult so the raw
//! operations in `fpos_abi` do not each repeat the classify/decide/record
//! sequence. Exported symbols use [`BridgeContext::global`]; tests build their
//! own context around a private registry.

use fposbridge_membrane::{
    BridgeMode, BridgeStats, Decision, HandleFacts, HandleRegistry, bridge_mode, classify,
    decide_copy, decide_release, global_registry,
};

#[derive(Debug, Clone, Copy)]
pub struct BridgeContext<'r> {
    pub mode: BridgeMode,
    pub registry: &'r HandleRegistry,
}

impl BridgeContext<'static> {
    /// Process-wide mode and registry.
    #[must_use]
    pub fn global() -> Self {
        Self {
            mode: bridge_mode(),
            registry: global_registry(),
        }
    }
}

impl<'r> BridgeContext<'r> {
    #[must_use]
    pub fn new(mode: BridgeMode, registry: &'r HandleRegistry) -> Self {
        Self { mode, registry }
    }

    /// Record a freshly allocated handle. Only hardened mode keeps the address.
    pub(crate) fn admit(&self, addr: usize, len: usize) {
        if self.mode.guards_enabled() {
            self.registry.register(addr, len);
        } else if self.mode.tracking_enabled() {
            self.registry.note_allocation();
        }
    }

    pub(crate) fn allocation_failed(&self) {
        if self.mode.tracking_enabled() {
            self.registry.note_allocation_failure();
        }
    }

    /// Decide a release and, when allowed, record it before memory is returned.
    pub(crate) fn release(&self, addr: usize) -> Decision {
        if !self.mode.guards_enabled() {
            if addr == 0 {
                return Decision::Skip;
            }
            if self.mode.tracking_enabled() {
                self.registry.note_release();
            }
            return Decision::Allow;
        }
        let decision = decide_release(self.mode, classify(self.registry, addr));
        match decision {
            Decision::Allow => {
                self.registry.release(addr);
            }
            Decision::Deny(_) => self.registry.note_denial(),
            Decision::Skip => {}
        }
        decision
    }

    /// Decide a copy and count it.
    pub(crate) fn copy(&self, dst: usize, src: usize) -> Decision {
        let decision = decide_copy(HandleFacts::unknown(dst), HandleFacts::unknown(src));
        if decision == Decision::Allow && self.mode.tracking_enabled() {
            self.registry.note_copy();
        }
        decision
    }

    /// Handles issued and not yet released, from the counters.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        usize::try_from(self.registry.stats().outstanding()).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        self.registry.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fposbridge_membrane::DenyReason;

    #[test]
    fn off_mode_leaves_registry_untouched() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Off, &registry);
        ctx.admit(0x100, 16);
        assert_eq!(ctx.copy(0x200, 0x100), Decision::Allow);
        assert_eq!(ctx.release(0x100), Decision::Allow);
        assert_eq!(ctx.release(0), Decision::Skip);
        assert_eq!(ctx.stats(), BridgeStats::default());
    }

    #[test]
    fn strict_mode_counts_without_remembering_addresses() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        ctx.admit(0x100, 16);
        assert_eq!(registry.lookup(0x100), None);
        assert_eq!(ctx.live_handles(), 1);

        assert_eq!(ctx.release(0x100), Decision::Allow);
        assert_eq!(ctx.live_handles(), 0);
        assert_eq!(registry.tracked_count(), 0);
        assert_eq!(ctx.stats().releases, 1);
        assert_eq!(ctx.stats().denials, 0);
    }

    #[test]
    fn hardened_mode_maps_live_handles_and_counts_denials() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        ctx.admit(0x100, 16);
        assert!(registry.lookup(0x100).is_some());

        assert_eq!(ctx.release(0x100), Decision::Allow);
        assert_eq!(registry.lookup(0x100), None);
        assert_eq!(ctx.release(0x100), Decision::Deny(DenyReason::NotLive));
        assert_eq!(ctx.copy(0x300, 0x100), Decision::Allow);
        assert_eq!(ctx.stats().denials, 1);
        assert_eq!(ctx.stats().copies, 1);
        assert_eq!(ctx.live_handles(), 0);
    }
}
