//! Release and copy decisions.

use crate::config::BridgeMode;
use crate::state::{DenyReason, HandleFacts, TemporalState};

/// What the boundary should do with a requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Carry out the operation as requested.
    Allow,
    /// Nothing to do (null handle, or copy onto itself).
    Skip,
    /// Refuse; the operation becomes a no-op.
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Skip => "skip",
            Self::Deny(_) => "deny",
        }
    }
}

/// Decide what to do with a release request.
#[must_use]
pub fn decide_release(mode: BridgeMode, facts: HandleFacts) -> Decision {
    if facts.is_null() {
        return Decision::Skip;
    }
    if !mode.guards_enabled() {
        return Decision::Allow;
    }
    match facts.temporal {
        TemporalState::Valid => Decision::Allow,
        TemporalState::Unknown => Decision::Deny(DenyReason::NotLive),
    }
}

/// Decide what to do with a copy request from `src` into `dst`.
///
/// Registry state plays no part: records in caller-owned memory are valid
/// copy endpoints, and that memory may sit at an address the bridge issued
/// and released earlier.
#[must_use]
pub fn decide_copy(dst: HandleFacts, src: HandleFacts) -> Decision {
    if dst.is_null() || src.is_null() || dst.addr == src.addr {
        return Decision::Skip;
    }
    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(addr: usize, temporal: TemporalState) -> HandleFacts {
        HandleFacts {
            addr,
            temporal,
            generation: None,
        }
    }

    #[test]
    fn null_release_is_skipped_in_every_mode() {
        for mode in [BridgeMode::Strict, BridgeMode::Hardened, BridgeMode::Off] {
            assert_eq!(decide_release(mode, HandleFacts::unknown(0)), Decision::Skip);
        }
    }

    #[test]
    fn strict_release_trusts_caller() {
        let foreign = facts(0x20, TemporalState::Unknown);
        assert_eq!(decide_release(BridgeMode::Strict, foreign), Decision::Allow);
    }

    #[test]
    fn hardened_release_denies_untracked() {
        assert_eq!(
            decide_release(BridgeMode::Hardened, facts(0x20, TemporalState::Unknown)),
            Decision::Deny(DenyReason::NotLive)
        );
        assert_eq!(
            decide_release(BridgeMode::Hardened, facts(0x30, TemporalState::Valid)),
            Decision::Allow
        );
    }

    #[test]
    fn self_copy_is_skipped() {
        let h = facts(0x40, TemporalState::Valid);
        assert_eq!(decide_copy(h, h), Decision::Skip);
        assert_eq!(decide_copy(h, HandleFacts::unknown(0)), Decision::Skip);
    }

    #[test]
    fn copy_allows_untracked_records() {
        let live = facts(0x10, TemporalState::Valid);
        let foreign = facts(0x20, TemporalState::Unknown);
        assert_eq!(decide_copy(foreign, live), Decision::Allow);
        assert_eq!(decide_copy(live, foreign), Decision::Allow);
    }
}
