//! Profile loading and breakpoint timelines for idlepilot.
//!
//! A profile describes, per channel, which policy applies from which elapsed
//! time on. This crate parses the profile file into typed [`Timeline`]s and
//! resolves the active and next breakpoint for a given cursor.
//!
//! # Modules
//!
//! - [`timeline`] -- Sorted breakpoint timelines with active/next resolution
//! - [`token`] -- Priority, challenge, consumable and time token parsers
//! - [`rebirth`] -- Rebirth targets and challenge plans
//! - [`profile`] -- The profile file layout, [`Profile`], and [`ProfileStore`]
//! - [`error`] -- Profile loading errors

pub mod error;
pub mod profile;
pub mod rebirth;
pub mod timeline;
pub mod token;

pub use error::ProfileError;
pub use profile::{EMPTY_TEMPLATE, Profile, ProfileStore};
pub use rebirth::{RebirthPlan, RebirthTarget};
pub use timeline::{Breakpoint, Timeline};
pub use token::{TimeSpec, parse_challenge, parse_consumable, parse_priority};
