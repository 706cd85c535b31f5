//! The opaque `fpos_t` record.
//!
//! The bridge never interprets the record; it only needs the host C library's
//! size and alignment so that an allocation can stand in for a real `fpos_t`.
//! `HostFpos` mirrors each supported libc's definition for that purpose only,
//! and its fields are never read.

use std::fmt;
use std::mem::{align_of, size_of};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod host {
    use std::ffi::{c_int, c_long};

    /// glibc `_G_fpos_t`: `__off_t __pos; __mbstate_t __state;`.
    #[repr(C)]
    #[derive(Clone, Copy)]
    pub(super) struct HostFpos {
        _pos: c_long,
        _state: [c_int; 2],
    }

    pub(super) const HOST_LIBC: &str = "glibc";
}

#[cfg(all(target_os = "linux", target_env = "musl"))]
mod host {
    use std::ffi::c_longlong;

    /// musl `union _G_fpos64_t { char __opaque[16]; long long __lldata; double __align; }`.
    #[repr(C)]
    #[derive(Clone, Copy)]
    pub(super) struct HostFpos {
        _opaque: [u8; 16],
        _align: [c_longlong; 0],
    }

    pub(super) const HOST_LIBC: &str = "musl";
}

#[cfg(not(all(target_os = "linux", any(target_env = "gnu", target_env = "musl"))))]
mod host {
    /// Apple, the BSDs and the Windows CRT define `fpos_t` as a 64-bit offset.
    pub(super) type HostFpos = i64;

    pub(super) const HOST_LIBC: &str = "off64";
}

use host::{HOST_LIBC, HostFpos};

/// Byte size of the host `fpos_t`.
pub const FPOS_SIZE: usize = size_of::<HostFpos>();

/// Alignment of the host `fpos_t`.
pub const FPOS_ALIGN: usize = align_of::<HostFpos>();

/// A host `fpos_t` treated as a blob of [`FPOS_SIZE`] bytes.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FposRecord {
    bytes: [u8; FPOS_SIZE],
    _align: [HostFpos; 0],
}

const _: () = assert!(FPOS_SIZE > 0);
const _: () = assert!(size_of::<FposRecord>() == FPOS_SIZE);
const _: () = assert!(align_of::<FposRecord>() == FPOS_ALIGN);

impl FposRecord {
    /// An all-zero record.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self::from_bytes([0; FPOS_SIZE])
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; FPOS_SIZE]) -> Self {
        Self { bytes, _align: [] }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FPOS_SIZE] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; FPOS_SIZE] {
        &mut self.bytes
    }

    /// Overwrite every byte of `self` with the bytes of `src`.
    pub fn copy_from(&mut self, src: &Self) {
        self.bytes = src.bytes;
    }

    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl Default for FposRecord {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl PartialEq for FposRecord {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for FposRecord {}

impl fmt::Debug for FposRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FposRecord(")?;
        for b in &self.bytes {
            write!(f, "{b:02x}")?;
        }
        f.write_str(")")
    }
}

/// Size and alignment of the record on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub size: usize,
    pub align: usize,
    /// Which libc definition the layout mirrors.
    pub host: &'static str,
}

#[must_use]
pub const fn record_layout() -> RecordLayout {
    RecordLayout {
        size: FPOS_SIZE,
        align: FPOS_ALIGN,
        host: HOST_LIBC,
    }
}
