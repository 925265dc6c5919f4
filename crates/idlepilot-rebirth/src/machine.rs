//! The rebirth state machine.
//!
//! Each check walks `Idle -> Eligible -> PreRebirthGate -> Committing` as
//! far as conditions allow and always ends back in `Idle`. A boss fight or
//! an instant-win sequence holds the machine in `Eligible`; a deferring
//! gate holds it in `PreRebirthGate`. Nothing carries over between checks
//! except what the host itself remembers.

use serde::Serialize;
use tracing::{debug, info, warn};

use idlepilot_profile::RebirthPlan;
use idlepilot_types::{ChallengeKind, GameStatus, Loadouts, RebirthControls};

use crate::eligibility::is_eligible;
use crate::gate::{DeferReason, RebirthOptions, run_gate};

/// Phase of a rebirth check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebirthPhase {
    /// Waiting for the rebirth condition.
    Idle,
    /// The condition holds.
    Eligible,
    /// Running the pre-rebirth gate.
    PreRebirthGate,
    /// Engaging the rebirth on the host.
    Committing,
}

/// Which rebirth was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebirthKind {
    /// A plain rebirth.
    Plain,
    /// A rebirth into a challenge run.
    Challenge(ChallengeKind),
}

/// Result of one rebirth check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebirthOutcome {
    /// The rebirth condition does not hold.
    NotEligible,
    /// Eligible, but a boss fight or instant-win sequence is running.
    Blocked,
    /// The gate held the rebirth back.
    Deferred(DeferReason),
    /// The host refused the rebirth.
    Refused,
    /// The rebirth happened.
    Committed(RebirthKind),
}

impl RebirthOutcome {
    /// Whether a rebirth happened, meaning cycle state must be reset.
    pub const fn committed(self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Drives rebirth checks and records the phases each check passed through.
#[derive(Debug, Clone)]
pub struct RebirthEngine {
    phase: RebirthPhase,
    trail: Vec<RebirthPhase>,
}

impl Default for RebirthEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RebirthEngine {
    /// A machine in `Idle`.
    pub const fn new() -> Self {
        Self {
            phase: RebirthPhase::Idle,
            trail: Vec::new(),
        }
    }

    /// The current phase. Always `Idle` between checks.
    pub const fn phase(&self) -> RebirthPhase {
        self.phase
    }

    /// Phases the last check entered, in order.
    pub fn trail(&self) -> &[RebirthPhase] {
        &self.trail
    }

    /// Run one rebirth check.
    pub fn check<H>(
        &mut self,
        host: &mut H,
        plan: &RebirthPlan,
        options: &RebirthOptions,
    ) -> RebirthOutcome
    where
        H: GameStatus + Loadouts + RebirthControls + ?Sized,
    {
        self.trail.clear();
        self.enter(RebirthPhase::Idle);
        let outcome = self.advance(host, plan, options);
        self.phase = RebirthPhase::Idle;
        outcome
    }

    fn advance<H>(
        &mut self,
        host: &mut H,
        plan: &RebirthPlan,
        options: &RebirthOptions,
    ) -> RebirthOutcome
    where
        H: GameStatus + Loadouts + RebirthControls + ?Sized,
    {
        if !is_eligible(host, plan) {
            return RebirthOutcome::NotEligible;
        }
        self.enter(RebirthPhase::Eligible);

        if host.boss_fight_active() || host.instant_win_active() {
            info!("Delaying rebirth while boss fight is in progress");
            return RebirthOutcome::Blocked;
        }

        self.enter(RebirthPhase::PreRebirthGate);
        let gate = run_gate(host, options);
        if let Some(reason) = gate.deferred {
            debug!(?reason, steps = ?gate.steps, "Rebirth deferred by gate");
            return RebirthOutcome::Deferred(reason);
        }

        self.enter(RebirthPhase::Committing);
        commit(host, plan).map_or_else(
            || {
                warn!("Host refused rebirth");
                RebirthOutcome::Refused
            },
            RebirthOutcome::Committed,
        )
    }

    fn enter(&mut self, phase: RebirthPhase) {
        self.phase = phase;
        self.trail.push(phase);
    }
}

/// Engage the rebirth: the first pending challenge target when not already
/// in a challenge, otherwise a plain rebirth.
fn commit<H>(host: &mut H, plan: &RebirthPlan) -> Option<RebirthKind>
where
    H: RebirthControls + ?Sized,
{
    if !host.in_challenge() {
        let next = plan.challenges.iter().find(|target| {
            let done = host.challenge_completions(target.kind);
            target.ordinal <= host.challenge_max_completions(target.kind)
                && Some(target.ordinal) == done.checked_add(1)
        });
        if let Some(target) = next {
            info!(challenge = %target, "Rebirthing into challenge");
            return host
                .engage_challenge(target.kind)
                .then_some(RebirthKind::Challenge(target.kind));
        }
    }

    info!("Normal rebirth engaged");
    host.engage_rebirth().then_some(RebirthKind::Plain)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use idlepilot_sandbox::SandboxHost;
    use idlepilot_types::ChallengeTarget;

    use super::*;

    fn time_plan(target: f64, challenges: Vec<ChallengeTarget>) -> RebirthPlan {
        RebirthPlan::from_type("TIME", target, challenges)
    }

    const fn challenge(kind: ChallengeKind, ordinal: u32) -> ChallengeTarget {
        ChallengeTarget { kind, ordinal }
    }

    fn ready_host() -> SandboxHost {
        let mut host = SandboxHost::new();
        host.elapsed = 4_000.0;
        host.min_rebirth_seconds = 180.0;
        host
    }

    #[test]
    fn commits_plain_rebirth_through_every_phase() {
        let mut host = ready_host();
        let mut engine = RebirthEngine::new();
        let plan = time_plan(3600.0, Vec::new());
        let outcome = engine.check(&mut host, &plan, &RebirthOptions::default());

        assert_eq!(outcome, RebirthOutcome::Committed(RebirthKind::Plain));
        assert_eq!(
            engine.trail(),
            &[
                RebirthPhase::Idle,
                RebirthPhase::Eligible,
                RebirthPhase::PreRebirthGate,
                RebirthPhase::Committing
            ]
        );
        assert_eq!(engine.phase(), RebirthPhase::Idle);
        assert_eq!(host.rebirths, 1);
        assert_eq!(host.elapsed, 0.0);
    }

    #[test]
    fn time_boundary_is_inclusive() {
        let plan = time_plan(3600.0, Vec::new());
        let mut engine = RebirthEngine::new();

        let mut host = ready_host();
        host.elapsed = 3599.0;
        assert_eq!(
            engine.check(&mut host, &plan, &RebirthOptions::default()),
            RebirthOutcome::NotEligible
        );
        host.elapsed = 3600.0;
        assert!(
            engine
                .check(&mut host, &plan, &RebirthOptions::default())
                .committed()
        );
    }

    #[test]
    fn never_commits_during_boss_fight_or_instant_win() {
        let plan = time_plan(60.0, Vec::new());
        let mut engine = RebirthEngine::new();
        for (boss, instant) in [(true, false), (false, true), (true, true)] {
            let mut host = ready_host();
            host.boss_fight = boss;
            host.instant_win = instant;
            let outcome = engine.check(&mut host, &plan, &RebirthOptions::default());
            assert_eq!(outcome, RebirthOutcome::Blocked);
            assert!(!engine.trail().contains(&RebirthPhase::Committing));
            assert_eq!(host.rebirths, 0);
        }
    }

    #[test]
    fn gate_runs_every_step_before_committing() {
        let mut host = ready_host();
        host.blood = 10.0;
        host.gold = 100.0;
        host.digger_costs = vec![10.0];
        let options = RebirthOptions {
            cast_blood_spells: true,
            upgrade_diggers: true,
            manage_yggdrasil: true,
            ..RebirthOptions::default()
        };
        let mut engine = RebirthEngine::new();

        host.harvestable = true;
        let outcome = engine.check(&mut host, &time_plan(60.0, Vec::new()), &options);
        assert_eq!(
            outcome,
            RebirthOutcome::Deferred(DeferReason::FruitHarvested)
        );
        assert_eq!(host.rebirths, 0);
        assert!(host.spells_cast.is_empty());

        let outcome = engine.check(&mut host, &time_plan(60.0, Vec::new()), &options);
        assert!(outcome.committed());
        assert!(!host.spells_cast.is_empty());
        assert!(host.digger_upgrades > 0);
    }

    #[test]
    fn picks_next_pending_challenge() {
        let mut host = ready_host();
        host.completions.insert(ChallengeKind::Basic, 3);
        host.completions.insert(ChallengeKind::Troll, 1);
        host.max_completions = 5;
        let plan = time_plan(
            60.0,
            vec![
                // Already done.
                challenge(ChallengeKind::Basic, 2),
                // Beyond the maximum.
                challenge(ChallengeKind::Blind, 6),
                challenge(ChallengeKind::Troll, 2),
                challenge(ChallengeKind::Basic, 4),
            ],
        );
        let mut engine = RebirthEngine::new();
        let outcome = engine.check(&mut host, &plan, &RebirthOptions::default());
        assert_eq!(
            outcome,
            RebirthOutcome::Committed(RebirthKind::Challenge(ChallengeKind::Troll))
        );
        assert_eq!(host.current_challenge, Some(ChallengeKind::Troll));
    }

    #[test]
    fn plain_rebirth_while_in_a_challenge() {
        let mut host = ready_host();
        host.current_challenge = Some(ChallengeKind::Blind);
        let plan = time_plan(60.0, vec![challenge(ChallengeKind::Basic, 1)]);
        let outcome = RebirthEngine::new().check(&mut host, &plan, &RebirthOptions::default());
        assert_eq!(outcome, RebirthOutcome::Committed(RebirthKind::Plain));
    }

    #[test]
    fn host_refusal_is_reported() {
        let mut host = ready_host();
        host.refuse_rebirth = true;
        let plan = time_plan(60.0, Vec::new());
        let outcome = RebirthEngine::new().check(&mut host, &plan, &RebirthOptions::default());
        assert_eq!(outcome, RebirthOutcome::Refused);
        assert!(!outcome.committed());
    }
}
