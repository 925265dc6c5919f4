//! Engine orchestration for idlepilot.
//!
//! This crate owns the cycle that drives a host: allocate each channel from
//! its active breakpoint, apply one-shot latch channels, cast maintenance
//! spells, and check the rebirth condition. Each phase is fault-isolated.
//!
//! # Modules
//!
//! - [`config`] -- Settings loading from `idlepilot.yaml`
//! - [`state`] -- Breakpoint pointers, latches and the consumables table
//! - [`latch`] -- Gear, digger, wandoos, NGU difficulty and consumable channels
//! - [`cycle`] -- Phases, [`CycleError`], per-phase isolation, cycle reports
//! - [`engine`] -- The [`Autopilot`] facade
//! - [`runner`] -- The async cycle loop
//!
//! [`CycleError`]: cycle::CycleError
//! [`Autopilot`]: engine::Autopilot

pub mod config;
pub mod cycle;
pub mod engine;
pub mod latch;
pub mod runner;
pub mod state;
