//! Scoped owner of a bridge-allocated record.
//!
//! [`FposHandle`] is the Rust-side face of `allocate_fpos_t` /
//! `deallocate_fpos_t`: the record is released when the handle drops, and
//! [`FposHandle::into_raw`] / [`FposHandle::from_raw`] move ownership across
//! the C boundary and back.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use fposbridge_core::{BridgeError, FPOS_SIZE, FposRecord, Result};

use crate::fpos_abi::{allocate_in, copy_in, deallocate_in};
use crate::runtime_policy::BridgeContext;

pub struct FposHandle {
    ptr: NonNull<FposRecord>,
    ctx: BridgeContext<'static>,
}

// SAFETY: the handle exclusively owns its heap record, like Box<FposRecord>,
// and the context only refers to a registry that is itself Sync.
unsafe impl Send for FposHandle {}
// SAFETY: shared access only reads bytes.
unsafe impl Sync for FposHandle {}

impl FposHandle {
    /// Allocate a zeroed record through the global bridge context.
    pub fn try_new() -> Result<Self> {
        Self::try_new_in(BridgeContext::global())
    }

    /// Allocate a zeroed record through `ctx`. The record is released through
    /// the same context when the handle drops.
    pub fn try_new_in(ctx: BridgeContext<'static>) -> Result<Self> {
        NonNull::new(allocate_in(&ctx))
            .map(|ptr| Self { ptr, ctx })
            .ok_or(BridgeError::AllocationFailed { size: FPOS_SIZE })
    }

    /// Allocate a record holding a copy of `record`.
    pub fn try_from_record(record: &FposRecord) -> Result<Self> {
        let mut handle = Self::try_new()?;
        handle.overwrite_from(record);
        Ok(handle)
    }

    /// Take back ownership of a raw handle, to be released through the global
    /// context.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`FposHandle::into_raw`] or `allocate_fpos_t`, must
    /// still be live, and must not be owned by anything else afterwards.
    #[must_use]
    pub unsafe fn from_raw(ptr: *mut FposRecord) -> Option<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_raw_in(ptr, BridgeContext::global()) }
    }

    /// Take back ownership of a raw handle, to be released through `ctx`.
    ///
    /// If `ctx` is hardened and the record was allocated while tracking was
    /// off (or through another registry), the release on drop is refused and
    /// the record stays allocated; the refusal is counted in
    /// [`BridgeStats::denials`](fposbridge_membrane::BridgeStats).
    ///
    /// # Safety
    ///
    /// Same as [`FposHandle::from_raw`].
    #[must_use]
    pub unsafe fn from_raw_in(ptr: *mut FposRecord, ctx: BridgeContext<'static>) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, ctx })
    }

    /// Give up ownership; the caller must eventually pass the pointer to
    /// `deallocate_fpos_t` or [`FposHandle::from_raw`].
    #[must_use]
    pub fn into_raw(self) -> *mut FposRecord {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    #[must_use]
    pub fn as_ptr(&self) -> *const FposRecord {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut FposRecord {
        self.ptr.as_ptr()
    }

    /// Overwrite this record with `src`, accounted as a bridge copy.
    pub fn overwrite_from(&mut self, src: &FposRecord) {
        let ctx = self.ctx;
        // SAFETY: self is live and exclusively borrowed, so `src` cannot alias it.
        let _ = unsafe { copy_in(&ctx, self.as_mut_ptr(), src) };
    }
}

impl Deref for FposHandle {
    type Target = FposRecord;

    fn deref(&self) -> &FposRecord {
        // SAFETY: ptr is live for as long as the handle exists.
        unsafe { self.ptr.as_ref() }
    }
}

impl DerefMut for FposHandle {
    fn deref_mut(&mut self) -> &mut FposRecord {
        // SAFETY: ptr is live and uniquely owned.
        unsafe { self.ptr.as_mut() }
    }
}

impl Drop for FposHandle {
    /// A hardened context may refuse the release (see
    /// [`FposHandle::from_raw_in`]); the refusal is counted, not reported.
    fn drop(&mut self) {
        // SAFETY: the handle owns a live record.
        let _ = unsafe { deallocate_in(&self.ctx, self.ptr.as_ptr()) };
    }
}

impl fmt::Debug for FposHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FposHandle")
            .field("addr", &self.ptr)
            .field("mode", &self.ctx.mode)
            .field("record", &**self)
            .finish()
    }
}
