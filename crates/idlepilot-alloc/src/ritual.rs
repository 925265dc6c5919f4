//! Blood ritual scheduling.
//!
//! The scheduler spends the idle magic budget on ritual slots from the
//! highest unlocked slot down. A slot is only started when it is affordable
//! and its projected completion fits every active deadline: the explicit
//! run-length ceiling (or one hour when none is set), the channel's next
//! breakpoint, and an armed time rebirth. Slots that do not fit have any
//! magic they already hold released.

use serde::Serialize;
use tracing::debug;

use idlepilot_types::{Channel, Difficulty, GameStatus, ResourcePools, RitualBoard, RitualSpeed};

use crate::fair_share::AllocContext;

/// Host ticks per second.
const TICKS_PER_SECOND: f64 = 50.0;
/// Magic power scaling applied at normal and evil difficulty.
const MAGIC_POWER_SCALE: f64 = 50_000.0;
/// Longest ETA admitted when no explicit run length is configured.
const DEFAULT_MAX_RUN_SECONDS: f64 = 3600.0;
/// Progress-per-tick clamp, matching the host's single-precision speed.
const RATE_LIMIT: f64 = f32::MAX as f64;

/// Why a slot was not started this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The gold cost exceeds available gold and the ritual has not started.
    Unaffordable,
    /// The ETA exceeds the run-length ceiling.
    TooLong,
    /// The ritual would finish after the next breakpoint.
    PastNextBreakpoint,
    /// The ritual would finish after the armed rebirth.
    PastRebirth,
}

/// What the scheduler did with each slot it looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RitualReport {
    /// `(slot, amount)` for every slot committed, highest slot first.
    pub committed: Vec<(usize, u64)>,
    /// `(slot, reason)` for every slot skipped.
    pub skipped: Vec<(usize, SkipReason)>,
}

impl RitualReport {
    /// Total magic committed across slots.
    pub fn total(&self) -> u64 {
        self.committed
            .iter()
            .fold(0_u64, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

/// Schedule rituals against the idle magic pool.
///
/// `run_seconds` is the explicit run-length ceiling configured on the
/// priority token. Deadlines come from `ctx`.
pub fn schedule_rituals<H>(
    host: &mut H,
    ctx: &AllocContext,
    run_seconds: Option<u32>,
) -> RitualReport
where
    H: ResourcePools + RitualBoard + GameStatus + ?Sized,
{
    let mut report = RitualReport::default();
    let mut budget = host.idle(Channel::Magic);
    let unlocked = host.rituals_unlocked();
    let elapsed = host.elapsed_seconds();
    let difficulty = host.difficulty();

    for slot in (0..host.ritual_count()).rev() {
        if budget == 0 || host.idle(Channel::Magic) == 0 {
            break;
        }
        if slot >= unlocked {
            continue;
        }

        if let Some(reason) =
            skip_reason(host, ctx, run_seconds, slot, budget, elapsed, difficulty)
        {
            debug!(slot, ?reason, "Skipping ritual");
            if host.ritual_committed(slot) > 0 {
                host.release_ritual(slot);
            }
            report.skipped.push((slot, reason));
            continue;
        }

        let amount = ritual_amount(budget, host.ritual_cap(slot));
        if amount == 0 {
            continue;
        }
        host.commit_ritual(slot, amount);
        budget = budget.saturating_sub(amount);
        debug!(slot, amount, budget, "Committed ritual");
        report.committed.push((slot, amount));
    }

    report
}

fn skip_reason<H>(
    host: &H,
    ctx: &AllocContext,
    run_seconds: Option<u32>,
    slot: usize,
    budget: u64,
    elapsed: f64,
    difficulty: Difficulty,
) -> Option<SkipReason>
where
    H: RitualBoard + GameStatus + ?Sized,
{
    let progress = host.ritual_progress(slot);
    if host.ritual_gold_cost(slot) > host.gold() && progress <= 0.0 {
        return Some(SkipReason::Unaffordable);
    }

    let speed = host.ritual_speed(slot);
    let eta = ritual_eta(progress, budget, host.magic_power(), &speed, difficulty);
    let ceiling = run_seconds.map_or(DEFAULT_MAX_RUN_SECONDS, f64::from);
    if eta.is_nan() || eta > ceiling {
        return Some(SkipReason::TooLong);
    }

    let completion = elapsed + eta;
    if ctx.next_breakpoint.is_some_and(|next| completion > next) {
        return Some(SkipReason::PastNextBreakpoint);
    }
    if ctx.rebirth_at.is_some_and(|at| completion > at) {
        return Some(SkipReason::PastRebirth);
    }
    None
}

/// Progress per host tick for a slot run with `budget` magic.
#[allow(clippy::cast_precision_loss)]
pub fn ritual_rate(
    budget: u64,
    magic_power: f64,
    speed: &RitualSpeed,
    difficulty: Difficulty,
) -> f64 {
    let divider = speed
        .dividers
        .get(difficulty.index())
        .copied()
        .unwrap_or(1.0);
    let base = budget as f64 * magic_power;
    let mut rate = match difficulty {
        Difficulty::Normal | Difficulty::Evil => base / MAGIC_POWER_SCALE / divider,
        Difficulty::Sadistic => base / divider,
    };
    if difficulty >= Difficulty::Sadistic {
        rate /= speed.sadistic_divider;
    }
    rate *= speed.speed_bonus;

    if rate <= -RATE_LIMIT {
        0.0
    } else {
        rate.min(RATE_LIMIT)
    }
}

/// Seconds until a slot at `progress` completes when run with `budget`.
pub fn ritual_eta(
    progress: f64,
    budget: u64,
    magic_power: f64,
    speed: &RitualSpeed,
    difficulty: Difficulty,
) -> f64 {
    (1.0 - progress) / ritual_rate(budget, magic_power, speed, difficulty) / TICKS_PER_SECOND
}

/// Magic to commit to a slot with capacity `cap` from `budget`.
///
/// At or above the cap this is the cap. Below it, the cap is split into
/// `ceil(cap / budget)` equal parts and one part plus one unit is committed,
/// never more than the budget.
pub fn ritual_amount(budget: u64, cap: u64) -> u64 {
    if budget >= cap {
        return cap;
    }
    let parts = cap.div_ceil(budget.max(1));
    cap.checked_div(parts)
        .unwrap_or(0)
        .saturating_add(1)
        .min(budget)
}
