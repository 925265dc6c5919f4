//! Host adapter traits.
//!
//! The engine never reaches into host internals. Everything it reads or
//! mutates goes through the traits in this module, which the host implements
//! against its own state. Every call is synchronous: when a method returns,
//! its effect is visible to the next query.
//!
//! The pool traits are transactional in the sense the fair-share allocator
//! relies on: query ([`ResourcePools::idle`]), mutate via a call
//! ([`ResourcePools::commit`]), re-query.
//!
//! The surface is versioned by [`HOST_ADAPTER_VERSION`]. A host reports the
//! version it was written against through [`HostInfo::adapter_version`] and
//! the engine refuses to start on a mismatch.

use crate::enums::{
    BloodSpell, ChallengeKind, Channel, Difficulty, LockOwner, OsVariant, ReclaimMode,
};
use crate::structs::{RitualSpeed, TargetKind};

/// Version of the adapter surface defined in this module.
pub const HOST_ADAPTER_VERSION: u32 = 1;

/// Startup probing.
pub trait HostInfo {
    /// The [`HOST_ADAPTER_VERSION`] this host implements.
    fn adapter_version(&self) -> u32;

    /// Names of required host objects that could not be located.
    ///
    /// An empty list means the host is ready.
    fn missing_components(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Global host readings shared by every phase.
pub trait GameStatus {
    /// Seconds since the last rebirth commit.
    fn elapsed_seconds(&self) -> f64;

    /// Spendable gold.
    fn gold(&self) -> f64;

    /// Current rebirth difficulty tier.
    fn difficulty(&self) -> Difficulty;

    /// Whether a boss fight is running.
    fn boss_fight_active(&self) -> bool;

    /// Whether a scripted instant-win sequence is running.
    fn instant_win_active(&self) -> bool;
}

/// Per-channel resource pools and the generic allocation slots.
pub trait ResourcePools {
    /// Unspent quantity currently available in `channel`.
    fn idle(&self, channel: Channel) -> u64;

    /// Take back allocated resource into the idle pool.
    fn reclaim(&mut self, channel: Channel, mode: ReclaimMode);

    /// Set the pending request amount for `channel` (the host's input box).
    fn set_request(&mut self, channel: Channel, amount: u64);

    /// Whether the slot(s) behind `kind` are unlocked.
    fn is_unlocked(&self, kind: &TargetKind) -> bool;

    /// How much more `kind` can absorb from `channel` before it reaches its
    /// cap. Uncapped slots report `u64::MAX`.
    fn cap_headroom(&self, channel: Channel, kind: &TargetKind) -> u64;

    /// Move `amount` from the idle pool into `kind`. Returns the quantity
    /// actually accepted.
    fn commit(&mut self, channel: Channel, kind: &TargetKind, amount: u64) -> u64;

    /// Notify dependent host views that `channel` allocations changed.
    fn refresh(&mut self, channel: Channel);
}

/// Ritual slots of the blood magic board.
pub trait RitualBoard {
    /// Total number of ritual slots.
    fn ritual_count(&self) -> usize;

    /// Number of unlocked slots. Slots `0..rituals_unlocked()` are usable.
    fn rituals_unlocked(&self) -> usize;

    /// Gold cost to run `slot`, discounts applied.
    fn ritual_gold_cost(&self, slot: usize) -> f64;

    /// Progress of `slot` in `0.0..=1.0`.
    fn ritual_progress(&self, slot: usize) -> f64;

    /// Magic currently committed to `slot`.
    fn ritual_committed(&self, slot: usize) -> u64;

    /// Magic needed to run `slot` at full speed.
    fn ritual_cap(&self, slot: usize) -> u64;

    /// Speed inputs for `slot`.
    fn ritual_speed(&self, slot: usize) -> RitualSpeed;

    /// Total magic power.
    fn magic_power(&self) -> f64;

    /// Release every unit of magic committed to `slot`.
    fn release_ritual(&mut self, slot: usize);

    /// Commit `amount` magic to `slot`.
    fn commit_ritual(&mut self, slot: usize, amount: u64);
}

/// Gear and digger loadouts, plus the smaller one-shot settings driven by
/// latch breakpoints.
pub trait Loadouts {
    /// Current owner of the gear-loadout lock.
    fn gear_lock(&self) -> LockOwner;

    /// Current owner of the digger-loadout lock.
    fn digger_lock(&self) -> LockOwner;

    /// Try to take the gear lock for `owner`. Never blocks.
    fn claim_gear_lock(&mut self, owner: LockOwner) -> bool;

    /// Try to take the digger lock for `owner`. Never blocks.
    fn claim_digger_lock(&mut self, owner: LockOwner) -> bool;

    /// Release the gear lock if `owner` holds it, restoring the gear that
    /// was equipped before the claim.
    fn release_gear_lock(&mut self, owner: LockOwner);

    /// Release the digger lock if `owner` holds it, restoring the diggers
    /// that were active before the claim.
    fn release_digger_lock(&mut self, owner: LockOwner);

    /// Equip the listed gear item ids.
    fn equip_gear(&mut self, items: &[u32]);

    /// Whether diggers can be managed right now.
    fn diggers_available(&self) -> bool;

    /// Activate exactly the listed diggers. Returns whether all of them were
    /// activated.
    fn equip_diggers(&mut self, diggers: &[u32]) -> bool;

    /// Number of diggers.
    fn digger_count(&self) -> usize;

    /// Gold cost of the next level of `digger`.
    fn digger_upgrade_cost(&self, digger: usize) -> f64;

    /// Buy one max level for `digger`.
    fn upgrade_digger(&mut self, digger: usize);

    /// Switch the wandoos OS. Returns whether the variant is available.
    fn set_os(&mut self, os: OsVariant) -> bool;

    /// Switch the NGU difficulty track. Returns whether the track was
    /// accepted for the current rebirth difficulty.
    fn set_ngu_difficulty(&mut self, difficulty: Difficulty) -> bool;

    /// Consume `quantity` of `item`. Returns whether anything was consumed.
    fn consume(&mut self, item: &str, quantity: u32) -> bool;
}

/// Rebirth readings and actions.
pub trait RebirthControls {
    /// Minimum elapsed seconds before the host allows a rebirth.
    fn min_rebirth_seconds(&self) -> f64;

    /// Whether any challenge is running.
    fn in_challenge(&self) -> bool;

    /// Whether the challenge `kind` is running.
    fn in_challenge_kind(&self, kind: ChallengeKind) -> bool;

    /// Completed runs of `kind`.
    fn challenge_completions(&self, kind: ChallengeKind) -> u32;

    /// Maximum completions of `kind`.
    fn challenge_max_completions(&self, kind: ChallengeKind) -> u32;

    /// Current number bonus divided by the previous rebirth's number bonus.
    fn number_bonus_ratio(&self) -> f64;

    /// Additional bosses the current number would let the player reach.
    fn additional_bosses_reachable(&self) -> f64;

    /// The host's estimate of minutes until the optimal rebirth moment, if
    /// its estimator is active.
    fn optimal_rebirth_minutes(&self, balanced: bool) -> Option<f64>;

    /// Whether any yggdrasil fruit can be harvested.
    fn any_harvestable(&self) -> bool;

    /// Harvest every ripe fruit.
    fn harvest_all(&mut self);

    /// Spendable blood.
    fn blood(&self) -> f64;

    /// Cast `spell`. `for_rebirth` lets the host spend past its usual
    /// reserve thresholds.
    fn cast_spell(&mut self, spell: BloodSpell, for_rebirth: bool);

    /// Engage a plain rebirth. Returns whether the rebirth happened.
    fn engage_rebirth(&mut self) -> bool;

    /// Engage a rebirth into challenge `kind`. Returns whether it happened.
    fn engage_challenge(&mut self, kind: ChallengeKind) -> bool;
}

/// Everything the engine needs from a host.
pub trait Host:
    HostInfo + GameStatus + ResourcePools + RitualBoard + Loadouts + RebirthControls
{
}

impl<T> Host for T where
    T: HostInfo + GameStatus + ResourcePools + RitualBoard + Loadouts + RebirthControls
{
}
