//! Cycle phases and per-phase fault isolation.
//!
//! One cycle runs these phases in order:
//!
//! 1. **Allocate** energy, magic and R3, each its own phase.
//! 2. **Latch** gear, diggers, wandoos, NGU difficulty and consumables,
//!    each its own phase.
//! 3. **Blood maintenance**: routine spell casting.
//! 4. **Rebirth check**: the rebirth state machine.
//!
//! Every phase runs inside [`isolate`]. A phase that returns a
//! [`CycleError`] or panics is logged with its name and skipped; the
//! remaining phases still run.

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use idlepilot_alloc::FairShareReport;
use idlepilot_rebirth::RebirthOutcome;
use idlepilot_types::Channel;

use crate::latch::LatchOutcome;
use crate::state::LatchChannel;

/// A phase of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Fair-share allocation of one channel.
    Allocate(Channel),
    /// One latch channel.
    Latch(LatchChannel),
    /// Routine blood spell casting.
    BloodMaintenance,
    /// The rebirth state machine.
    RebirthCheck,
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Allocate(channel) => write!(f, "allocate_{channel}"),
            Self::Latch(channel) => write!(f, "latch_{channel}"),
            Self::BloodMaintenance => f.write_str("blood_maintenance"),
            Self::RebirthCheck => f.write_str("rebirth_check"),
        }
    }
}

/// Errors that abort a single phase.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The host returned NaN or an infinity for a reading the phase needs.
    #[error("non-finite host reading {reading}: {value}")]
    NonFinite {
        /// Name of the reading.
        reading: &'static str,
        /// The value returned.
        value: f64,
    },

    /// The phase panicked.
    #[error("phase panicked: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

/// Reject NaN and infinite host readings.
pub const fn finite(reading: &'static str, value: f64) -> Result<f64, CycleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CycleError::NonFinite { reading, value })
    }
}

/// Run `body` as `phase`, containing errors and panics.
///
/// Returns `None` when the phase failed; the failure is logged and pushed
/// onto `failures`.
pub fn isolate<R, F>(phase: Phase, failures: &mut Vec<Phase>, body: F) -> Option<R>
where
    F: FnOnce() -> Result<R, CycleError>,
{
    let result = catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Err(CycleError::Panicked { message })
    });

    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(%phase, error = %e, "Cycle phase failed");
            failures.push(phase);
            None
        }
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// Host elapsed seconds when the cycle started, if readable.
    pub elapsed: Option<f64>,
    /// Fair-share results per allocated channel.
    pub allocations: Vec<(Channel, FairShareReport)>,
    /// Outcome per latch channel that ran.
    pub latches: Vec<(LatchChannel, LatchOutcome)>,
    /// Whether maintenance spells were cast.
    pub blood_maintenance: bool,
    /// Rebirth check outcome, when the check ran.
    pub rebirth: Option<RebirthOutcome>,
    /// Phases that failed.
    pub failures: Vec<Phase>,
}

impl CycleReport {
    /// An empty report stamped now.
    pub fn new(elapsed: Option<f64>) -> Self {
        Self {
            started_at: Utc::now(),
            elapsed,
            allocations: Vec::new(),
            latches: Vec::new(),
            blood_maintenance: false,
            rebirth: None,
            failures: Vec::new(),
        }
    }

    /// Whether this cycle committed a rebirth.
    pub fn rebirthed(&self) -> bool {
        self.rebirth.is_some_and(RebirthOutcome::committed)
    }
}
