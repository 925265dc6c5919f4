//! Rebirth eligibility.
//!
//! Every target first has to pass the base checks: the host's minimum
//! rebirth time has passed and the player is not in the no-rebirth
//! challenge. Then the target's own condition decides.

use idlepilot_profile::{RebirthPlan, RebirthTarget};
use idlepilot_types::{ChallengeKind, GameStatus, RebirthControls};

/// Whether the host allows any rebirth right now.
pub fn base_checks<H>(host: &H) -> bool
where
    H: GameStatus + RebirthControls + ?Sized,
{
    host.elapsed_seconds() > host.min_rebirth_seconds()
        && !host.in_challenge_kind(ChallengeKind::NoRebirth)
}

/// Whether `plan` wants to rebirth now.
///
/// The time target is inclusive: a target of 3600 is met at exactly 3600
/// elapsed seconds.
pub fn is_eligible<H>(host: &H, plan: &RebirthPlan) -> bool
where
    H: GameStatus + RebirthControls + ?Sized,
{
    if plan.is_disabled() || !base_checks(host) {
        return false;
    }

    match plan.target {
        RebirthTarget::NoRebirth => false,
        RebirthTarget::Time { target_seconds } => host.elapsed_seconds() >= target_seconds,
        RebirthTarget::Number { multiplier_target } => {
            host.number_bonus_ratio() >= multiplier_target
        }
        RebirthTarget::BossNum { boss_delta } => host.additional_bosses_reachable() >= boss_delta,
        RebirthTarget::Muffin {
            minute_buffer,
            balanced,
        } => host
            .optimal_rebirth_minutes(balanced)
            .is_some_and(|minutes| minutes <= minute_buffer),
    }
}
