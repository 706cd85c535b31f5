//! # fposbridge-membrane
//!
//! Bookkeeping that sits between the C boundary and the heap: how many
//! handles the bridge has issued and released, which addresses are live (in
//! hardened mode only), and what a release or copy should do about it under
//! the configured [`config::BridgeMode`].
//!
//! Nothing here touches record memory. The ABI crate asks for a
//! [`policy::Decision`] and performs the raw operation itself.

pub mod config;
pub mod policy;
pub mod registry;
pub mod state;

pub use config::{BridgeMode, bridge_mode};
pub use policy::{Decision, decide_copy, decide_release};
pub use registry::{BridgeStats, HandleMeta, HandleRegistry, classify, global_registry};
pub use state::{DenyReason, HandleFacts, TemporalState};
