//! Rebirth decisions for idlepilot.
//!
//! Decides when the configured rebirth condition holds, runs the
//! pre-rebirth gate that spends what the run would otherwise lose, and
//! commits plain or challenge rebirths. Also hosts the routine blood spell
//! maintenance that runs between rebirths.
//!
//! # Modules
//!
//! - [`eligibility`] -- Base checks and per-target rebirth conditions
//! - [`gate`] -- Yggdrasil harvest, digger upgrades, blood spells, maintenance
//! - [`machine`] -- The `Idle -> Eligible -> PreRebirthGate -> Committing` machine

pub mod eligibility;
pub mod gate;
pub mod machine;

pub use eligibility::{base_checks, is_eligible};
pub use gate::{
    BLOOD_RESERVE_WINDOW_SECONDS, DeferReason, GateReport, GateStep, RebirthOptions,
    YGGDRASIL_DIGGERS, run_blood_maintenance, run_gate, upgrade_cheapest_diggers,
};
pub use machine::{RebirthEngine, RebirthKind, RebirthOutcome, RebirthPhase};
