//! Cycle loop runner.
//!
//! [`run_autopilot`] drives [`Autopilot::run_cycle`] on a fixed
//! `tokio::time::interval` until the shutdown future resolves or an
//! optional cycle limit is reached. Host calls stay synchronous; the loop
//! only awaits the timer and the shutdown signal.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use idlepilot_types::Host;

use crate::cycle::CycleReport;
use crate::engine::Autopilot;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future resolved.
    Shutdown,
    /// The cycle limit was reached.
    CycleLimit,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub stop_reason: StopReason,
    /// Cycles completed.
    pub cycles: u64,
    /// Rebirths committed during the run.
    pub rebirths: u64,
    /// The last cycle's report, if any cycle ran.
    pub last_report: Option<CycleReport>,
}

/// Callback invoked after each cycle.
pub trait CycleCallback<H> {
    /// Called after cycle number `cycle` (starting at 1) completes.
    fn on_cycle(&mut self, cycle: u64, report: &CycleReport, host: &mut H);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl<H> CycleCallback<H> for NoOpCallback {
    fn on_cycle(&mut self, _cycle: u64, _report: &CycleReport, _host: &mut H) {}
}

/// Run cycles every `cycle_interval_ms` until `shutdown` resolves or
/// `max_cycles` cycles have run.
///
/// The first cycle runs immediately. Missed ticks are delayed rather than
/// bursted. A resolved shutdown wins over a ready tick.
pub async fn run_autopilot<H, S>(
    autopilot: &mut Autopilot<H>,
    callback: &mut dyn CycleCallback<H>,
    max_cycles: Option<u64>,
    shutdown: S,
) -> RunSummary
where
    H: Host,
    S: Future<Output = ()>,
{
    let interval_ms = autopilot.settings().cycle_interval_ms.max(1);
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(interval_ms, max_cycles, "Cycle loop starting");

    let mut summary = RunSummary {
        stop_reason: StopReason::Shutdown,
        cycles: 0,
        rebirths: 0,
        last_report: None,
    };

    loop {
        if max_cycles.is_some_and(|max| summary.cycles >= max) {
            summary.stop_reason = StopReason::CycleLimit;
            break;
        }

        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("Shutdown requested");
                summary.stop_reason = StopReason::Shutdown;
                break;
            }
            _ = ticker.tick() => {}
        }

        let report = autopilot.run_cycle();
        summary.cycles = summary.cycles.saturating_add(1);
        if report.rebirthed() {
            summary.rebirths = summary.rebirths.saturating_add(1);
        }
        callback.on_cycle(summary.cycles, &report, autopilot.host_mut());
        summary.last_report = Some(report);
    }

    info!(
        reason = ?summary.stop_reason,
        cycles = summary.cycles,
        rebirths = summary.rebirths,
        "Cycle loop stopped"
    );
    summary
}
