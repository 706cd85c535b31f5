//! Error type shared by the safe bridge APIs.

use std::ffi::NulError;
use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Nul(#[from] NulError),
    #[error(transparent)]
    Utf8(#[from] FromUtf8Error),
    #[error("allocation of {size} bytes failed")]
    AllocationFailed { size: usize },
    #[error("invalid stream mode {0:?}")]
    InvalidMode(String),
    #[error("cannot open {path}: errno {errno}")]
    Open { path: String, errno: i32 },
    #[error("cannot write to stream: {call} failed (errno {errno})")]
    Write { call: &'static str, errno: i32 },
    #[error("cannot read from stream: {call} failed (errno {errno})")]
    Read { call: &'static str, errno: i32 },
    #[error("cannot reposition stream: {call} failed (errno {errno})")]
    Position { call: &'static str, errno: i32 },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
