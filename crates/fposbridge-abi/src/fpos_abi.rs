//! ABI layer for the `fpos_t` bridge.
//!
//! Handle contract for every symbol below: a non-null handle passed in must
//! come from `allocate_fpos_t` and must not have been released, unless it
//! points at a caller-owned `fpos_t` and the operation only copies bytes.
//! In strict mode the contract is trusted and nothing but counters is kept.
//! In hardened mode a release of an address that is not a live handle is
//! turned into a no-op; copies are never refused.

use std::alloc::{Layout, alloc_zeroed};

use fposbridge_core::{FPOS_SIZE, FposRecord, write_greeting};
use fposbridge_membrane::Decision;

use crate::runtime_policy::BridgeContext;

// ---------------------------------------------------------------------------
// Raw operations
// ---------------------------------------------------------------------------

/// Allocate a zeroed record and register it with `ctx`. Null on allocator failure.
#[must_use]
pub fn allocate_in(ctx: &BridgeContext<'_>) -> *mut FposRecord {
    let layout = Layout::new::<FposRecord>();
    // SAFETY: FposRecord has non-zero size (checked at compile time in core).
    let ptr = unsafe { alloc_zeroed(layout) }.cast::<FposRecord>();
    if ptr.is_null() {
        ctx.allocation_failed();
        return ptr;
    }
    ctx.admit(ptr as usize, FPOS_SIZE);
    ptr
}

/// Release a record previously returned by [`allocate_in`].
///
/// # Safety
///
/// Unless `ctx` runs in hardened mode, `ptr` must be null or a live handle from
/// [`allocate_in`].
pub unsafe fn deallocate_in(ctx: &BridgeContext<'_>, ptr: *mut FposRecord) -> Decision {
    let decision = ctx.release(ptr as usize);
    if decision == Decision::Allow {
        // SAFETY: allocated by alloc_zeroed with Layout::new::<FposRecord>(),
        // which is the layout Box uses for the global allocator.
        drop(unsafe { Box::from_raw(ptr) });
    }
    decision
}

/// Overwrite all bytes of `dst` with the bytes of `src`.
///
/// # Safety
///
/// Both pointers must be null or valid for `FPOS_SIZE` bytes, and must either
/// be identical or not overlap.
pub unsafe fn copy_in(
    ctx: &BridgeContext<'_>,
    dst: *mut FposRecord,
    src: *const FposRecord,
) -> Decision {
    let decision = ctx.copy(dst as usize, src as usize);
    if decision == Decision::Allow {
        // SAFETY: caller guarantees validity and non-overlap; identical
        // pointers were turned into Skip above.
        unsafe { std::ptr::copy_nonoverlapping(src, dst, 1) };
    }
    decision
}

/// Write the greeting to stdout. Output errors are dropped.
pub fn greet() {
    let mut out = std::io::stdout().lock();
    let _ = write_greeting(&mut out);
}

// ---------------------------------------------------------------------------
// Exported symbols
// ---------------------------------------------------------------------------

abi_fn! {
    /// `fpos_t *allocate_fpos_t(void)`: new zeroed record owned by the caller,
    /// or NULL if the allocator fails.
    fn allocate_fpos_t() -> *mut FposRecord {
        allocate_in(&BridgeContext::global())
    } else std::ptr::null_mut()
}

abi_fn! {
    /// `void deallocate_fpos_t(fpos_t *ptr)`: release a record. NULL is ignored.
    fn deallocate_fpos_t(ptr: *mut FposRecord) {
        let _ = deallocate_in(&BridgeContext::global(), ptr);
    }
}

abi_fn! {
    /// `void copy_fpos_t(fpos_t *dst, const fpos_t *src)`: byte-for-byte copy.
    /// `dst == src` and NULL arguments are no-ops.
    fn copy_fpos_t(dst: *mut FposRecord, src: *const FposRecord) {
        let _ = copy_in(&BridgeContext::global(), dst, src);
    }
}

abi_fn! {
    /// `void hello_world(void)`: writes `Hello, world!` to stdout, no newline.
    fn hello_world() {
        greet();
    }
}

abi_fn! {
    /// `size_t fposbridge_fpos_size(void)`: byte size of the host `fpos_t`.
    fn fposbridge_fpos_size() -> usize {
        FPOS_SIZE
    } else FPOS_SIZE
}

abi_fn! {
    /// `size_t fposbridge_live_handles(void)`: handles issued and not released,
    /// from the registry counters. Always 0 when tracking is off.
    fn fposbridge_live_handles() -> usize {
        BridgeContext::global().live_handles()
    } else 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fposbridge_membrane::{BridgeMode, DenyReason, HandleRegistry};

    fn patterned() -> FposRecord {
        let mut record = FposRecord::zeroed();
        for (i, b) in record.as_bytes_mut().iter_mut().enumerate() {
            *b = 0xA0 ^ i as u8;
        }
        record
    }

    #[test]
    fn allocate_returns_zeroed_counted_record() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        let h = allocate_in(&ctx);
        assert!(!h.is_null());
        assert_eq!(h as usize % fposbridge_core::FPOS_ALIGN, 0);
        // SAFETY: h is a live handle from allocate_in.
        assert!(unsafe { &*h }.is_zeroed());
        assert_eq!(ctx.live_handles(), 1);

        // SAFETY: h is live and released exactly once.
        assert_eq!(unsafe { deallocate_in(&ctx, h) }, Decision::Allow);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn strict_mode_retains_nothing_per_handle() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        let handles: Vec<*mut FposRecord> = (0..10_000).map(|_| allocate_in(&ctx)).collect();
        assert_eq!(registry.tracked_count(), 0);
        for &h in &handles {
            // SAFETY: each handle is live and released exactly once.
            assert_eq!(unsafe { deallocate_in(&ctx, h) }, Decision::Allow);
        }
        assert!(handles.iter().all(|&h| registry.lookup(h as usize).is_none()));
        assert_eq!(registry.tracked_count(), 0);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn hardened_mode_forgets_released_handles() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        let handles: Vec<*mut FposRecord> = (0..1_000).map(|_| allocate_in(&ctx)).collect();
        assert_eq!(registry.tracked_count(), handles.len());
        for &h in &handles {
            // SAFETY: each handle is live and released exactly once.
            assert_eq!(unsafe { deallocate_in(&ctx, h) }, Decision::Allow);
        }
        assert_eq!(registry.tracked_count(), 0);
    }

    #[test]
    fn copy_makes_bytes_identical() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        let a = allocate_in(&ctx);
        let b = allocate_in(&ctx);
        // SAFETY: a and b are distinct live handles.
        unsafe {
            *a = patterned();
            assert_eq!(copy_in(&ctx, b, a), Decision::Allow);
            assert_eq!((*b).as_bytes(), (*a).as_bytes());
            deallocate_in(&ctx, a);
            deallocate_in(&ctx, b);
        }
        assert_eq!(registry.stats().copies, 1);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn self_copy_is_noop() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        let h = allocate_in(&ctx);
        // SAFETY: h is live; identical dst/src is allowed.
        unsafe {
            *h = patterned();
            assert_eq!(copy_in(&ctx, h, h), Decision::Skip);
            assert_eq!(*h, patterned());
            deallocate_in(&ctx, h);
        }
    }

    #[test]
    fn copy_into_foreign_record() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        let src = patterned();
        let mut dst = FposRecord::zeroed();
        // SAFETY: both point at distinct stack records.
        let decision = unsafe { copy_in(&ctx, &mut dst, &src) };
        assert_eq!(decision, Decision::Allow);
        assert_eq!(dst, src);
    }

    #[test]
    fn hardened_copy_into_record_at_released_address() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        let released = allocate_in(&ctx);
        // SAFETY: released is live and released exactly once.
        assert_eq!(unsafe { deallocate_in(&ctx, released) }, Decision::Allow);

        // The allocator usually hands the same block back; either way the
        // caller-owned record must accept the copy.
        let mut owned = Box::new(FposRecord::zeroed());
        let src = patterned();
        // SAFETY: owned and src are distinct live records.
        let decision = unsafe { copy_in(&ctx, &mut *owned, &src) };
        assert_eq!(decision, Decision::Allow);
        assert_eq!(*owned, src);
        assert_eq!(registry.lookup(released as usize), None);
    }

    #[test]
    fn null_arguments_are_ignored() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Strict, &registry);
        let mut record = FposRecord::zeroed();
        // SAFETY: null pointers are never dereferenced.
        unsafe {
            assert_eq!(deallocate_in(&ctx, std::ptr::null_mut()), Decision::Skip);
            assert_eq!(
                copy_in(&ctx, &mut record, std::ptr::null()),
                Decision::Skip
            );
        }
        assert!(record.is_zeroed());
    }

    #[test]
    fn hardened_double_release_is_refused() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        let h = allocate_in(&ctx);
        // SAFETY: first release is valid; the second is refused before any
        // memory access.
        unsafe {
            assert_eq!(deallocate_in(&ctx, h), Decision::Allow);
            assert_eq!(
                deallocate_in(&ctx, h),
                Decision::Deny(DenyReason::NotLive)
            );
        }
        assert_eq!(registry.stats().denials, 1);
        assert_eq!(registry.stats().releases, 1);
    }

    #[test]
    fn hardened_foreign_release_is_refused() {
        let registry = HandleRegistry::new();
        let ctx = BridgeContext::new(BridgeMode::Hardened, &registry);
        let mut stack = FposRecord::zeroed();
        // SAFETY: refused before Box::from_raw is reached.
        let decision = unsafe { deallocate_in(&ctx, &mut stack) };
        assert_eq!(decision, Decision::Deny(DenyReason::NotLive));
    }

    #[test]
    fn size_symbol_reports_record_size() {
        // SAFETY: no arguments.
        assert_eq!(unsafe { fposbridge_fpos_size() }, FPOS_SIZE);
    }
}
