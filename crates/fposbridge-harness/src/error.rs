//! Harness error type.

use fposbridge_core::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("smoke check failed: {0}")]
    SmokeFailed(String),
    #[error("{errors} invalid line(s) in {path}")]
    InvalidLog { path: String, errors: usize },
}
