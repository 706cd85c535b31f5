//! Smoke-test harness for the fpos_t bridge.
//!
//! This crate provides:
//! - The end-to-end smoke scenario (allocate, populate via `fgetpos`, copy,
//!   compare, release, leak check), logged step by step as JSONL.
//! - The stream reading demo that walks a file by saved positions.
//! - Structured logging and log validation shared by both.

#![forbid(unsafe_code)]

pub mod demo;
pub mod error;
pub mod smoke;
pub mod structured_log;

pub use error::HarnessError;
pub use smoke::{SmokeReport, record_digest, run_smoke};
