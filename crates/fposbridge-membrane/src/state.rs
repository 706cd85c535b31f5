//! Core handle state types.

/// What the registry knows about an address.
///
/// Released handles are forgotten, so an address the allocator has handed out
/// again to someone else reads as `Unknown` rather than as a stale handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalState {
    /// Not a live tracked handle: never issued, already released, or
    /// tracking is not enabled.
    Unknown,
    /// Handle is currently live.
    Valid,
}

impl TemporalState {
    /// Stable lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
        }
    }
}

/// Derived facts about an address according to registry metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleFacts {
    /// Raw address.
    pub addr: usize,
    /// Temporal state classification.
    pub temporal: TemporalState,
    /// Issue sequence number of the tracked handle, if any.
    pub generation: Option<u64>,
}

impl HandleFacts {
    /// Facts for an address with no metadata.
    #[must_use]
    pub const fn unknown(addr: usize) -> Self {
        Self {
            addr,
            temporal: TemporalState::Unknown,
            generation: None,
        }
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.addr == 0
    }
}

/// Why the policy refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// Release of an address that is not a live tracked handle: a double
    /// release, or memory the bridge never issued.
    NotLive,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotLive => "not_live",
        }
    }
}
