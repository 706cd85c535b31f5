// Exported symbols take raw handles from a foreign runtime; the contract for
// each is documented once on the symbol tables in `fpos_abi`.
#![allow(clippy::missing_safety_doc)]
//! # fposbridge-abi
//!
//! C ABI boundary that lets a foreign runtime allocate, copy and release the C
//! library's `fpos_t` without knowing its layout, plus a greeting symbol for
//! smoke-testing the link.
//!
//! This crate produces a `cdylib` exposing:
//!
//! ```text
//! fpos_t *allocate_fpos_t(void);
//! void    deallocate_fpos_t(fpos_t *ptr);
//! void    copy_fpos_t(fpos_t *dst, const fpos_t *src);
//! void    hello_world(void);
//! size_t  fposbridge_fpos_size(void);
//! size_t  fposbridge_live_handles(void);
//! ```
//!
//! Each entry consults the membrane (`fposbridge-membrane`) for bookkeeping
//! and, in hardened mode, for a go/no-go decision before touching memory.
//! Rust callers get the same operations through [`FposHandle`] and [`CFile`].

#[macro_use]
mod macros;

pub mod file;
pub mod fpos_abi;
pub mod handle;
pub mod runtime_policy;

pub use file::{CFile, open_file};
pub use fpos_abi::greet;
pub use handle::FposHandle;
pub use runtime_policy::BridgeContext;
