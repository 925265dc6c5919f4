//! Resource allocation for idlepilot.
//!
//! Distributes a channel's idle pool across the active breakpoint's
//! targets using an iterative fair-share loop, and schedules blood rituals
//! under deadline admission control.
//!
//! # Modules
//!
//! - [`fair_share`] -- The fair-share loop, generic over [`ShareTarget`]
//! - [`target`] -- Target dispatch, slot commits, and per-channel allocation
//! - [`ritual`] -- The blood ritual scheduler

pub mod fair_share;
pub mod ritual;
pub mod target;

pub use fair_share::{AllocContext, FairShareReport, ShareTarget, fair_share, share_of};
pub use ritual::{RitualReport, SkipReason, ritual_amount, ritual_eta, schedule_rituals};
pub use target::{allocate_channel, allocate_slot, reclaim_mode};
