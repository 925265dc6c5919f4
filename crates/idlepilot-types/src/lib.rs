//! Shared type definitions for the idlepilot workspace.
//!
//! This crate is the single source of truth for the types that flow between
//! the profile parser, the allocator, the rebirth engine and the host.
//!
//! # Modules
//!
//! - [`enums`] -- Channels, difficulty tiers, challenge kinds, lock owners, spells
//! - [`structs`] -- Allocation targets, challenge targets, consumable orders
//! - [`host`] -- Versioned host adapter traits

pub mod enums;
pub mod host;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BloodSpell, ChallengeKind, Channel, Difficulty, LockOwner, OsVariant, ReclaimMode};
pub use host::{
    GameStatus, HOST_ADAPTER_VERSION, Host, HostInfo, Loadouts, RebirthControls, ResourcePools,
    RitualBoard,
};
pub use structs::{AllocationTarget, ChallengeTarget, ConsumableOrder, RitualSpeed, TargetKind};
