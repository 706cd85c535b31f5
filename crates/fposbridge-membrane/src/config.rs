//! Runtime mode configuration.
//!
//! The mode is set via the `FPOSBRIDGE_MODE` environment variable:
//! - `strict` (default): the caller is trusted. Only counters are updated;
//!   no address is remembered, and every operation is carried out as
//!   requested, so a foreign or reused handle is undefined behavior exactly as
//!   in C.
//! - `hardened`: live handles are kept in an address map until released.
//!   Releases of addresses not in the map become counted no-ops.
//! - `off`: no bookkeeping. Reachable through the API only, for benchmarks.

use std::sync::atomic::{AtomicU8, Ordering};

/// Env var holding the runtime mode.
pub const MODE_ENV: &str = "FPOSBRIDGE_MODE";

/// Runtime operating mode for the bridge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeMode {
    /// Trust the caller; count operations only.
    #[default]
    Strict,
    /// Refuse releases of addresses that are not live handles.
    Hardened,
    /// No tracking at all.
    Off,
}

impl BridgeMode {
    /// Parse from string (case-insensitive). Unrecognized input maps to `Strict`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardened" | "guarded" | "checked" => Self::Hardened,
            "off" | "none" | "disabled" => Self::Off,
            _ => Self::Strict,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Hardened => "hardened",
            Self::Off => "off",
        }
    }

    /// Returns true if operations are counted in the registry.
    #[must_use]
    pub const fn tracking_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Returns true if live addresses are mapped and untracked releases refused.
    #[must_use]
    pub const fn guards_enabled(self) -> bool {
        matches!(self, Self::Hardened)
    }
}

// 0=unresolved, 1=Strict, 2=Hardened, 3=Off, 255=resolving.
static CACHED_MODE: AtomicU8 = AtomicU8::new(MODE_UNRESOLVED);

const MODE_UNRESOLVED: u8 = 0;
const MODE_STRICT: u8 = 1;
const MODE_HARDENED: u8 = 2;
const MODE_OFF: u8 = 3;
const MODE_RESOLVING: u8 = 255;

fn parse_mode_env(raw: &str) -> BridgeMode {
    // `off` stays API-only so a stray env value cannot silently disable accounting.
    match BridgeMode::from_str_loose(raw) {
        BridgeMode::Off => BridgeMode::Strict,
        mode => mode,
    }
}

fn mode_to_u8(mode: BridgeMode) -> u8 {
    match mode {
        BridgeMode::Strict => MODE_STRICT,
        BridgeMode::Hardened => MODE_HARDENED,
        BridgeMode::Off => MODE_OFF,
    }
}

fn u8_to_mode(v: u8) -> BridgeMode {
    match v {
        MODE_HARDENED => BridgeMode::Hardened,
        MODE_OFF => BridgeMode::Off,
        _ => BridgeMode::Strict,
    }
}

/// Get the configured mode (reads the env var on first call, caches thereafter).
///
/// A call that races an in-flight resolution sees `Strict`.
#[must_use]
pub fn bridge_mode() -> BridgeMode {
    let cached = CACHED_MODE.load(Ordering::Acquire);
    if cached != MODE_UNRESOLVED && cached != MODE_RESOLVING {
        return u8_to_mode(cached);
    }
    if cached == MODE_RESOLVING {
        return BridgeMode::Strict;
    }

    if CACHED_MODE
        .compare_exchange(
            MODE_UNRESOLVED,
            MODE_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        let v = CACHED_MODE.load(Ordering::Acquire);
        return if v != MODE_UNRESOLVED && v != MODE_RESOLVING {
            u8_to_mode(v)
        } else {
            BridgeMode::Strict
        };
    }

    let mode = std::env::var(MODE_ENV)
        .map(|v| parse_mode_env(&v))
        .unwrap_or_default();
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
    mode
}

/// Override the cached mode. Later [`bridge_mode`] calls return `mode`.
pub fn set_bridge_mode(mode: BridgeMode) {
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
}
