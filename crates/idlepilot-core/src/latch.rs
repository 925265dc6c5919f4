//! One-shot breakpoint channels.
//!
//! Gear, diggers, wandoos OS, NGU difficulty and consumables are applied
//! once per breakpoint rather than every cycle. Each channel resolves its
//! active breakpoint, re-arms its [`Latch`](crate::state::Latch) when the
//! breakpoint changed, and applies the payload if the latch is still open.
//!
//! A channel that cannot apply right now (a held loadout lock, a difficulty
//! the host rejects) leaves the latch open and retries next cycle.

use serde::Serialize;
use tracing::{debug, info, warn};

use idlepilot_profile::{Breakpoint, Profile, Timeline};
use idlepilot_types::{Loadouts, LockOwner};

use crate::state::{EngineState, LatchChannel};

/// What happened on one latch channel this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LatchOutcome {
    /// No breakpoint is active.
    Inactive,
    /// The active breakpoint was applied earlier.
    AlreadyApplied,
    /// The payload was applied now.
    Applied,
    /// The host was not ready; retried next cycle.
    Pending,
}

/// Run one latch channel.
pub fn run_latch<H>(
    host: &mut H,
    profile: &Profile,
    state: &mut EngineState,
    channel: LatchChannel,
    elapsed: f64,
) -> LatchOutcome
where
    H: Loadouts + ?Sized,
{
    match channel {
        LatchChannel::Gear => latched(&profile.gear, state, channel, elapsed, |bp, _| {
            apply_gear(host, bp)
        }),
        LatchChannel::Diggers => latched(&profile.diggers, state, channel, elapsed, |bp, _| {
            apply_diggers(host, bp)
        }),
        LatchChannel::Wandoos => latched(&profile.wandoos, state, channel, elapsed, |bp, _| {
            if !host.set_os(bp.payload) {
                warn!(os = ?bp.payload, "Wandoos OS not available, skipping");
            }
            true
        }),
        LatchChannel::NguDiff => latched(&profile.ngu_diff, state, channel, elapsed, |bp, _| {
            let accepted = host.set_ngu_difficulty(bp.payload);
            if accepted {
                info!(difficulty = ?bp.payload, "Switched NGU difficulty");
            } else {
                debug!(difficulty = ?bp.payload, "NGU difficulty not reachable yet");
            }
            accepted
        }),
        LatchChannel::Consumables => {
            latched(&profile.consumables, state, channel, elapsed, |bp, state| {
                for order in &bp.payload {
                    if state.already_consumed(&order.item, bp.activation_time) {
                        continue;
                    }
                    if host.consume(&order.item, order.quantity) {
                        info!(item = %order.item, quantity = order.quantity, "Used consumable");
                        state.record_consumed(&order.item, bp.activation_time);
                    } else {
                        debug!(item = %order.item, "Consumable not available");
                    }
                }
                true
            })
        }
    }
}

/// Resolve, re-arm, and apply when the latch is open. `apply` returns
/// whether the payload took effect.
fn latched<T, F>(
    timeline: &Timeline<T>,
    state: &mut EngineState,
    channel: LatchChannel,
    elapsed: f64,
    apply: F,
) -> LatchOutcome
where
    F: FnOnce(&Breakpoint<T>, &mut EngineState) -> bool,
{
    let Some(bp) = timeline.resolve_active(elapsed) else {
        return LatchOutcome::Inactive;
    };
    if !state.latch_mut(channel).observe(bp.activation_time) {
        return LatchOutcome::AlreadyApplied;
    }
    if apply(bp, state) {
        state.latch_mut(channel).mark_applied();
        LatchOutcome::Applied
    } else {
        LatchOutcome::Pending
    }
}

fn apply_gear<H>(host: &mut H, bp: &Breakpoint<Vec<u32>>) -> bool
where
    H: Loadouts + ?Sized,
{
    let owner = host.gear_lock();
    if owner != LockOwner::None {
        debug!(?owner, "Gear lock held, deferring loadout");
        return false;
    }
    info!(time = bp.activation_time, items = ?bp.payload, "Equipping gear loadout");
    host.equip_gear(&bp.payload);
    true
}

fn apply_diggers<H>(host: &mut H, bp: &Breakpoint<Vec<u32>>) -> bool
where
    H: Loadouts + ?Sized,
{
    let owner = host.digger_lock();
    if owner != LockOwner::None || !host.diggers_available() {
        debug!(?owner, "Diggers unavailable, deferring");
        return false;
    }
    if host.equip_diggers(&bp.payload) {
        info!(diggers = ?bp.payload, "Equipping diggers");
        true
    } else {
        debug!("Not every configured digger was enabled, retrying next cycle");
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlepilot_sandbox::SandboxHost;
    use idlepilot_types::{ConsumableOrder, Difficulty, OsVariant};

    use super::*;

    fn profile() -> Profile {
        Profile {
            gear: Timeline::new(vec![
                Breakpoint::new(0.0, vec![1, 2]),
                Breakpoint::new(600.0, vec![3]),
            ]),
            diggers: Timeline::new(vec![Breakpoint::new(0.0, vec![0, 3])]),
            wandoos: Timeline::new(vec![Breakpoint::new(0.0, OsVariant::WandoosMeh)]),
            ngu_diff: Timeline::new(vec![Breakpoint::new(0.0, Difficulty::Evil)]),
            consumables: Timeline::new(vec![Breakpoint::new(
                30.0,
                vec![
                    ConsumableOrder {
                        item: "EPOT-A".to_owned(),
                        quantity: 2,
                    },
                    ConsumableOrder {
                        item: "MPOT-A".to_owned(),
                        quantity: 1,
                    },
                ],
            )]),
            ..Profile::empty()
        }
    }

    #[test]
    fn gear_applies_once_per_breakpoint() {
        let mut host = SandboxHost::new();
        let mut state = EngineState::new();
        let profile = profile();

        let run = |host: &mut SandboxHost, state: &mut EngineState, t: f64| {
            run_latch(host, &profile, state, LatchChannel::Gear, t)
        };
        assert_eq!(run(&mut host, &mut state, 10.0), LatchOutcome::Applied);
        assert_eq!(host.equipped_gear, vec![1, 2]);

        host.equipped_gear = vec![99];
        assert_eq!(
            run(&mut host, &mut state, 20.0),
            LatchOutcome::AlreadyApplied
        );
        assert_eq!(host.equipped_gear, vec![99]);

        assert_eq!(run(&mut host, &mut state, 600.0), LatchOutcome::Applied);
        assert_eq!(host.equipped_gear, vec![3]);
    }

    #[test]
    fn held_gear_lock_defers_until_free() {
        let mut host = SandboxHost::new();
        host.gear_lock = LockOwner::Titan;
        let mut state = EngineState::new();
        let profile = profile();

        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::Gear, 10.0),
            LatchOutcome::Pending
        );
        assert!(host.equipped_gear.is_empty());

        host.gear_lock = LockOwner::None;
        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::Gear, 10.0),
            LatchOutcome::Applied
        );
    }

    #[test]
    fn diggers_need_availability_and_confirmation() {
        let mut host = SandboxHost::new();
        host.diggers_available = false;
        let mut state = EngineState::new();
        let profile = profile();

        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::Diggers, 0.0),
            LatchOutcome::Pending
        );
        host.diggers_available = true;
        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::Diggers, 0.0),
            LatchOutcome::Applied
        );
        assert_eq!(host.active_diggers, vec![0, 3]);
    }

    #[test]
    fn ngu_difficulty_waits_for_rebirth_tier() {
        let mut host = SandboxHost::new();
        let mut state = EngineState::new();
        let profile = profile();

        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::NguDiff, 0.0),
            LatchOutcome::Pending
        );
        host.difficulty = Difficulty::Sadistic;
        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::NguDiff, 0.0),
            LatchOutcome::Applied
        );
        assert_eq!(host.ngu_diff, Difficulty::Evil);
    }

    #[test]
    fn unavailable_os_still_latches() {
        let mut host = SandboxHost::new();
        host.os_available = vec![OsVariant::Wandoos98];
        let profile = profile();
        let mut state = EngineState::new();
        assert_eq!(
            run_latch(&mut host, &profile, &mut state, LatchChannel::Wandoos, 0.0),
            LatchOutcome::Applied
        );
        assert_eq!(host.os, None);
    }

    #[test]
    fn consumables_are_not_reused_after_reload() {
        let mut host = SandboxHost::new();
        host.out_of_stock.insert("MPOT-A".to_owned());
        let mut state = EngineState::new();
        let profile = profile();
        let channel = LatchChannel::Consumables;

        assert_eq!(
            run_latch(&mut host, &profile, &mut state, channel, 10.0),
            LatchOutcome::Inactive
        );
        assert_eq!(
            run_latch(&mut host, &profile, &mut state, channel, 40.0),
            LatchOutcome::Applied
        );
        assert_eq!(host.consumed, vec![("EPOT-A".to_owned(), 2)]);

        // A reload re-arms the latch, the side table still blocks EPOT-A.
        state.reset_pointers();
        host.out_of_stock.clear();
        run_latch(&mut host, &profile, &mut state, channel, 40.0);
        assert_eq!(
            host.consumed,
            vec![("EPOT-A".to_owned(), 2), ("MPOT-A".to_owned(), 1)]
        );
    }
}
