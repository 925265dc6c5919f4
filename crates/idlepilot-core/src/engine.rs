//! The engine facade.
//!
//! [`Autopilot`] owns the host, the settings, the loaded profile and the
//! [`EngineState`], and exposes each cycle phase as a method. Every phase
//! method is fault-isolated through [`isolate`], so none of them return
//! errors; failures are logged and recorded on the [`CycleReport`].
//!
//! The only fallible operation is [`Autopilot::new`], which refuses hosts
//! that implement a different adapter version or are missing components.

use std::path::Path;

use tracing::{debug, info};

use idlepilot_alloc::{AllocContext, FairShareReport, allocate_channel};
use idlepilot_profile::{Profile, ProfileStore};
use idlepilot_rebirth::{RebirthEngine, RebirthOptions, RebirthOutcome, run_blood_maintenance};
use idlepilot_types::{Channel, HOST_ADAPTER_VERSION, Host};

use crate::config::AutomationSettings;
use crate::cycle::{CycleError, CycleReport, Phase, finite, isolate};
use crate::latch::{LatchOutcome, run_latch};
use crate::state::{EngineState, LatchChannel};

/// Errors raised while starting the engine.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The host cannot be driven.
    #[error("host unavailable: {reason}")]
    HostUnavailable {
        /// What the probe found.
        reason: String,
    },
}

/// The automation engine bound to one host.
#[derive(Debug)]
pub struct Autopilot<H> {
    host: H,
    settings: AutomationSettings,
    options: RebirthOptions,
    store: ProfileStore,
    state: EngineState,
    rebirth: RebirthEngine,
}

impl<H: Host> Autopilot<H> {
    /// Probe `host` and build an engine with an empty profile.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HostUnavailable`] when the host reports a
    /// different adapter version or is missing components.
    pub fn new(host: H, settings: AutomationSettings) -> Result<Self, CoreError> {
        let version = host.adapter_version();
        if version != HOST_ADAPTER_VERSION {
            return Err(CoreError::HostUnavailable {
                reason: format!(
                    "adapter version {version}, engine expects {HOST_ADAPTER_VERSION}"
                ),
            });
        }
        let missing = host.missing_components();
        if !missing.is_empty() {
            return Err(CoreError::HostUnavailable {
                reason: format!("missing components: {}", missing.join(", ")),
            });
        }

        info!(
            adapter_version = version,
            cycle_interval_ms = settings.cycle_interval_ms,
            auto_rebirth = settings.auto_rebirth,
            "Host probe passed"
        );
        let options = settings.rebirth_options();
        Ok(Self {
            host,
            settings,
            options,
            store: ProfileStore::from_profile(Profile::empty()),
            state: EngineState::new(),
            rebirth: RebirthEngine::new(),
        })
    }

    /// Replace the profile without touching the filesystem.
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.store = ProfileStore::from_profile(profile);
        self.state.reset_pointers();
        self
    }

    /// The host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The settings.
    pub const fn settings(&self) -> &AutomationSettings {
        &self.settings
    }

    /// The loaded profile.
    pub const fn profile(&self) -> &Profile {
        &self.store.profile
    }

    /// The profile store, including where and when it was loaded.
    pub const fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// The cross-cycle state.
    pub const fn state(&self) -> &EngineState {
        &self.state
    }

    /// The rebirth state machine.
    pub const fn rebirth_engine(&self) -> &RebirthEngine {
        &self.rebirth
    }

    /// Rebuild the profile store from `path` and reset pointers and latches.
    ///
    /// Never fails: a missing file is created from the template, and a
    /// broken one leaves an empty, rebirth-disabled profile.
    pub fn reload_profile(&mut self, path: &Path) {
        self.store = ProfileStore::load(path);
        self.state.reset_pointers();
    }

    /// Allocate every managed channel and apply every managed latch
    /// channel.
    pub fn run_allocation_cycle(&mut self) -> CycleReport {
        let elapsed = finite("elapsed_seconds", self.host.elapsed_seconds()).ok();
        let mut report = CycleReport::new(elapsed);
        self.allocate_into(&mut report);
        self.latch_into(&mut report);
        report
    }

    /// Routine blood spell casting. Returns whether spells were cast.
    pub fn run_pre_commit_resource_maintenance(&mut self) -> bool {
        let mut failures = Vec::new();
        self.maintain(&mut failures)
    }

    /// Run the rebirth state machine once, when automatic rebirth is on.
    ///
    /// A committed rebirth resets pointers, latches and the consumables
    /// table.
    pub fn run_rebirth_check(&mut self) -> Option<RebirthOutcome> {
        let mut failures = Vec::new();
        self.check_rebirth(&mut failures)
    }

    /// One full cycle: allocation, latches, maintenance, rebirth check.
    pub fn run_cycle(&mut self) -> CycleReport {
        if !self.settings.global_enabled {
            debug!("Automation disabled, skipping cycle");
            return CycleReport::new(None);
        }

        let mut report = self.run_allocation_cycle();
        report.blood_maintenance = self.maintain(&mut report.failures);
        report.rebirth = self.check_rebirth(&mut report.failures);
        report
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn allocate_into(&mut self, report: &mut CycleReport) {
        let armed = if self.options.auto_rebirth {
            self.store.profile.rebirth.armed_time()
        } else {
            None
        };

        for channel in Channel::ALL {
            if !self.settings.manages(channel) {
                continue;
            }
            let host = &mut self.host;
            let profile = &self.store.profile;
            let state = &mut self.state;
            let allocated = isolate(Phase::Allocate(channel), &mut report.failures, || {
                allocate_one(host, profile, state, channel, armed)
            });
            if let Some(allocation) = allocated {
                report.allocations.push((channel, allocation));
            }
        }
    }

    fn latch_into(&mut self, report: &mut CycleReport) {
        for channel in LatchChannel::ALL {
            if !self.manages_latch(channel) {
                continue;
            }
            let host = &mut self.host;
            let profile = &self.store.profile;
            let state = &mut self.state;
            let outcome = isolate(Phase::Latch(channel), &mut report.failures, || {
                let elapsed = finite("elapsed_seconds", host.elapsed_seconds())?;
                Ok(run_latch(host, profile, state, channel, elapsed))
            });
            if let Some(outcome) = outcome.filter(|o| *o != LatchOutcome::Inactive) {
                report.latches.push((channel, outcome));
            }
        }
    }

    fn maintain(&mut self, failures: &mut Vec<Phase>) -> bool {
        let host = &mut self.host;
        let plan = &self.store.profile.rebirth;
        let options = &self.options;
        isolate(Phase::BloodMaintenance, failures, || {
            finite("elapsed_seconds", host.elapsed_seconds())?;
            Ok(run_blood_maintenance(host, plan, options))
        })
        .unwrap_or(false)
    }

    fn check_rebirth(&mut self, failures: &mut Vec<Phase>) -> Option<RebirthOutcome> {
        if !self.options.auto_rebirth {
            return None;
        }
        let host = &mut self.host;
        let plan = &self.store.profile.rebirth;
        let options = &self.options;
        let engine = &mut self.rebirth;
        let outcome = isolate(Phase::RebirthCheck, failures, || {
            finite("elapsed_seconds", host.elapsed_seconds())?;
            Ok(engine.check(host, plan, options))
        })?;

        if outcome.committed() {
            info!(?outcome, "Rebirth committed, resetting engine state");
            self.state.reset_after_rebirth();
        }
        Some(outcome)
    }

    const fn manages_latch(&self, channel: LatchChannel) -> bool {
        match channel {
            LatchChannel::Gear => self.settings.manage_gear,
            LatchChannel::Diggers => self.settings.manage_diggers,
            LatchChannel::Wandoos => self.settings.manage_wandoos,
            LatchChannel::NguDiff => self.settings.manage_ngu_diff,
            LatchChannel::Consumables => self.settings.manage_consumables,
        }
    }
}

/// Allocate one channel from its active breakpoint.
///
/// No active breakpoint means no targets; the channel is still refreshed.
fn allocate_one<H>(
    host: &mut H,
    profile: &Profile,
    state: &mut EngineState,
    channel: Channel,
    armed: Option<f64>,
) -> Result<FairShareReport, CycleError>
where
    H: Host + ?Sized,
{
    let elapsed = finite("elapsed_seconds", host.elapsed_seconds())?;
    let timeline = profile.allocation(channel);

    let ctx = AllocContext {
        channel,
        next_breakpoint: timeline.resolve_next(elapsed).map(|bp| bp.activation_time),
        rebirth_at: armed,
    };

    let targets = match timeline.resolve_active(elapsed) {
        Some(bp) => {
            if state.set_pointer(channel, bp.activation_time) {
                info!(
                    %channel,
                    time = bp.activation_time,
                    targets = bp.payload.len(),
                    "Switched breakpoint"
                );
            }
            bp.payload.as_slice()
        }
        None => &[],
    };

    Ok(allocate_channel(host, &ctx, targets))
}
