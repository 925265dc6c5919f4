//! An in-memory host for idlepilot.
//!
//! [`SandboxHost`] implements every adapter trait against plain fields, so
//! the allocator, the rebirth engine and the full cycle can be exercised
//! without a running game. Pool arithmetic is transactional in the way the
//! engine expects: every mutation is visible to the next query.
//!
//! The model is deliberately small:
//!
//! - A channel's idle pool is its total minus everything committed to its
//!   slots (and, for magic, to ritual slots).
//! - Partial reclaim keeps basic training allocations on energy; every
//!   other allocation, ritual magic included, is returned.
//! - Buying a digger level spends its cost in gold and doubles the cost.
//! - Casting a spell spends [`SandboxHost::spell_cost`] blood; the rebirth
//!   number spell spends all of it.
//! - A committed rebirth zeroes elapsed time and clears allocations.
//!
//! Public fields are the test-facing knobs. Pool state goes through the
//! builder and accessor methods.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use idlepilot_types::{
    BloodSpell, ChallengeKind, Channel, Difficulty, GameStatus, HOST_ADAPTER_VERSION, HostInfo,
    Loadouts, LockOwner, OsVariant, RebirthControls, ReclaimMode, ResourcePools, RitualBoard,
    RitualSpeed, TargetKind,
};

/// One ritual slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxRitual {
    /// Gold needed to start the ritual.
    pub gold_cost: f64,
    /// Progress in `0.0..=1.0`.
    pub progress: f64,
    /// Magic currently committed.
    pub committed: u64,
    /// Magic for full speed.
    pub cap: u64,
    /// Speed inputs.
    pub speed: RitualSpeed,
}

impl SandboxRitual {
    /// A free, unstarted ritual with capacity `cap`.
    pub fn with_cap(cap: u64) -> Self {
        Self {
            gold_cost: 0.0,
            progress: 0.0,
            committed: 0,
            cap,
            speed: RitualSpeed::default(),
        }
    }
}

/// In-memory host.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct SandboxHost {
    /// Reported adapter version.
    pub adapter_version: u32,
    /// Components reported missing at startup.
    pub missing: Vec<&'static str>,

    /// Seconds since the last rebirth.
    pub elapsed: f64,
    /// Spendable gold.
    pub gold: f64,
    /// Rebirth difficulty.
    pub difficulty: Difficulty,
    /// A boss fight is running.
    pub boss_fight: bool,
    /// An instant-win sequence is running.
    pub instant_win: bool,

    totals: HashMap<Channel, u64>,
    allocations: HashMap<(Channel, TargetKind), u64>,
    caps: HashMap<(Channel, TargetKind), u64>,
    locked: HashSet<TargetKind>,
    requests: HashMap<Channel, Vec<u64>>,
    refreshes: HashMap<Channel, u32>,

    /// Ritual slots.
    pub rituals: Vec<SandboxRitual>,
    /// Number of usable ritual slots.
    pub rituals_unlocked: usize,
    /// Total magic power.
    pub magic_power: f64,

    /// Gear lock owner.
    pub gear_lock: LockOwner,
    /// Digger lock owner.
    pub digger_lock: LockOwner,
    /// Equipped gear item ids.
    pub equipped_gear: Vec<u32>,
    saved_gear: Vec<u32>,
    /// Diggers can be managed.
    pub diggers_available: bool,
    /// Active digger ids.
    pub active_diggers: Vec<u32>,
    saved_diggers: Vec<u32>,
    /// Upgrade cost per digger.
    pub digger_costs: Vec<f64>,
    /// Digger levels bought.
    pub digger_upgrades: u32,
    /// Wandoos OS.
    pub os: Option<OsVariant>,
    /// OS variants the host will accept.
    pub os_available: Vec<OsVariant>,
    /// NGU difficulty track.
    pub ngu_diff: Difficulty,
    /// Items and quantities consumed, in order.
    pub consumed: Vec<(String, u32)>,
    /// Items the host has none of.
    pub out_of_stock: HashSet<String>,

    /// Host minimum rebirth time.
    pub min_rebirth_seconds: f64,
    /// Running challenge.
    pub current_challenge: Option<ChallengeKind>,
    /// Completions per challenge.
    pub completions: HashMap<ChallengeKind, u32>,
    /// Maximum completions of every challenge.
    pub max_completions: u32,
    /// Number bonus ratio against the previous rebirth.
    pub number_ratio: f64,
    /// Additional reachable bosses.
    pub bosses_reachable: f64,
    /// Fixed muffin estimate in minutes.
    pub optimal_minutes: Option<f64>,
    /// Time-balanced muffin estimate in minutes.
    pub optimal_minutes_balanced: Option<f64>,
    /// Yggdrasil fruit is ripe.
    pub harvestable: bool,
    /// Harvests performed.
    pub harvests: u32,
    /// Spendable blood.
    pub blood: f64,
    /// Blood spent per spell.
    pub spell_cost: f64,
    /// Spells cast with their `for_rebirth` flag.
    pub spells_cast: Vec<(BloodSpell, bool)>,
    /// Rebirths committed.
    pub rebirths: u32,
    /// Refuse every rebirth.
    pub refuse_rebirth: bool,
}

impl Default for SandboxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxHost {
    /// A ready host with empty pools.
    pub fn new() -> Self {
        Self {
            adapter_version: HOST_ADAPTER_VERSION,
            missing: Vec::new(),
            elapsed: 0.0,
            gold: 0.0,
            difficulty: Difficulty::Normal,
            boss_fight: false,
            instant_win: false,
            totals: HashMap::new(),
            allocations: HashMap::new(),
            caps: HashMap::new(),
            locked: HashSet::new(),
            requests: HashMap::new(),
            refreshes: HashMap::new(),
            rituals: Vec::new(),
            rituals_unlocked: 0,
            magic_power: 1.0,
            gear_lock: LockOwner::None,
            digger_lock: LockOwner::None,
            equipped_gear: Vec::new(),
            saved_gear: Vec::new(),
            diggers_available: true,
            active_diggers: Vec::new(),
            saved_diggers: Vec::new(),
            digger_costs: Vec::new(),
            digger_upgrades: 0,
            os: None,
            os_available: vec![
                OsVariant::Wandoos98,
                OsVariant::WandoosMeh,
                OsVariant::WandoosXl,
            ],
            ngu_diff: Difficulty::Normal,
            consumed: Vec::new(),
            out_of_stock: HashSet::new(),
            min_rebirth_seconds: 0.0,
            current_challenge: None,
            completions: HashMap::new(),
            max_completions: 10,
            number_ratio: 0.0,
            bosses_reachable: 0.0,
            optimal_minutes: None,
            optimal_minutes_balanced: None,
            harvestable: false,
            harvests: 0,
            blood: 0.0,
            spell_cost: 0.0,
            spells_cast: Vec::new(),
            rebirths: 0,
            refuse_rebirth: false,
        }
    }

    /// Set the total size of `channel`'s pool.
    #[must_use]
    pub fn with_pool(mut self, channel: Channel, total: u64) -> Self {
        self.totals.insert(channel, total);
        self
    }

    /// Cap how much `kind` can hold from `channel`.
    #[must_use]
    pub fn with_cap(mut self, channel: Channel, kind: TargetKind, cap: u64) -> Self {
        self.caps.insert((channel, kind), cap);
        self
    }

    /// Mark `kind` as locked.
    #[must_use]
    pub fn with_locked(mut self, kind: TargetKind) -> Self {
        self.locked.insert(kind);
        self
    }

    /// Resize `channel`'s pool in place.
    pub fn set_pool(&mut self, channel: Channel, total: u64) {
        self.totals.insert(channel, total);
    }

    /// Quantity `kind` holds from `channel`.
    pub fn allocated(&self, channel: Channel, kind: &TargetKind) -> u64 {
        self.allocations
            .get(&(channel, *kind))
            .copied()
            .unwrap_or(0)
    }

    /// Every non-zero allocation of `channel`, keyed by target token.
    pub fn allocations(&self, channel: Channel) -> BTreeMap<String, u64> {
        self.allocations
            .iter()
            .filter(|((c, _), amount)| *c == channel && **amount > 0)
            .map(|((_, kind), amount)| (kind.to_string(), *amount))
            .collect()
    }

    /// Every request set on `channel`, oldest first.
    pub fn requests(&self, channel: Channel) -> Vec<u64> {
        self.requests.get(&channel).cloned().unwrap_or_default()
    }

    /// How often `channel` was refreshed.
    pub fn refreshes(&self, channel: Channel) -> u32 {
        self.refreshes.get(&channel).copied().unwrap_or(0)
    }

    /// Let `seconds` of game time pass.
    pub const fn advance(&mut self, seconds: f64) {
        self.elapsed += seconds;
    }

    fn committed(&self, channel: Channel) -> u64 {
        let slots = self
            .allocations
            .iter()
            .filter(|((c, _), _)| *c == channel)
            .fold(0_u64, |acc, (_, amount)| acc.saturating_add(*amount));
        let rituals = if channel == Channel::Magic {
            self.rituals
                .iter()
                .fold(0_u64, |acc, r| acc.saturating_add(r.committed))
        } else {
            0
        };
        slots.saturating_add(rituals)
    }

    fn reset_run(&mut self) {
        self.elapsed = 0.0;
        self.allocations.clear();
        for ritual in &mut self.rituals {
            ritual.committed = 0;
            ritual.progress = 0.0;
        }
    }
}

impl HostInfo for SandboxHost {
    fn adapter_version(&self) -> u32 {
        self.adapter_version
    }

    fn missing_components(&self) -> Vec<&'static str> {
        self.missing.clone()
    }
}

impl GameStatus for SandboxHost {
    fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    fn gold(&self) -> f64 {
        self.gold
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn boss_fight_active(&self) -> bool {
        self.boss_fight
    }

    fn instant_win_active(&self) -> bool {
        self.instant_win
    }
}

impl ResourcePools for SandboxHost {
    fn idle(&self, channel: Channel) -> u64 {
        let total = self.totals.get(&channel).copied().unwrap_or(0);
        total.saturating_sub(self.committed(channel))
    }

    fn reclaim(&mut self, channel: Channel, mode: ReclaimMode) {
        self.allocations.retain(|(c, kind), _| {
            *c != channel
                || (mode == ReclaimMode::Partial
                    && channel == Channel::Energy
                    && kind.is_basic_training())
        });
        if channel == Channel::Magic {
            for ritual in &mut self.rituals {
                ritual.committed = 0;
            }
        }
    }

    fn set_request(&mut self, channel: Channel, amount: u64) {
        self.requests.entry(channel).or_default().push(amount);
    }

    fn is_unlocked(&self, kind: &TargetKind) -> bool {
        !self.locked.contains(kind)
    }

    fn cap_headroom(&self, channel: Channel, kind: &TargetKind) -> u64 {
        self.caps
            .get(&(channel, *kind))
            .map_or(u64::MAX, |cap| {
                cap.saturating_sub(self.allocated(channel, kind))
            })
    }

    fn commit(&mut self, channel: Channel, kind: &TargetKind, amount: u64) -> u64 {
        let accepted = amount
            .min(self.idle(channel))
            .min(self.cap_headroom(channel, kind));
        if accepted > 0 {
            let slot = self.allocations.entry((channel, *kind)).or_default();
            *slot = slot.saturating_add(accepted);
            debug!(%channel, %kind, accepted, "Sandbox commit");
        }
        accepted
    }

    fn refresh(&mut self, channel: Channel) {
        let count = self.refreshes.entry(channel).or_default();
        *count = count.saturating_add(1);
    }
}

impl RitualBoard for SandboxHost {
    fn ritual_count(&self) -> usize {
        self.rituals.len()
    }

    fn rituals_unlocked(&self) -> usize {
        self.rituals_unlocked.min(self.rituals.len())
    }

    fn ritual_gold_cost(&self, slot: usize) -> f64 {
        self.rituals
            .get(slot)
            .map_or(f64::INFINITY, |r| r.gold_cost)
    }

    fn ritual_progress(&self, slot: usize) -> f64 {
        self.rituals.get(slot).map_or(0.0, |r| r.progress)
    }

    fn ritual_committed(&self, slot: usize) -> u64 {
        self.rituals.get(slot).map_or(0, |r| r.committed)
    }

    fn ritual_cap(&self, slot: usize) -> u64 {
        self.rituals.get(slot).map_or(0, |r| r.cap)
    }

    fn ritual_speed(&self, slot: usize) -> RitualSpeed {
        self.rituals.get(slot).map(|r| r.speed).unwrap_or_default()
    }

    fn magic_power(&self) -> f64 {
        self.magic_power
    }

    fn release_ritual(&mut self, slot: usize) {
        if let Some(ritual) = self.rituals.get_mut(slot) {
            ritual.committed = 0;
        }
    }

    fn commit_ritual(&mut self, slot: usize, amount: u64) {
        let amount = amount.min(self.idle(Channel::Magic));
        if let Some(ritual) = self.rituals.get_mut(slot) {
            ritual.committed = ritual.committed.saturating_add(amount);
        }
    }
}

impl Loadouts for SandboxHost {
    fn gear_lock(&self) -> LockOwner {
        self.gear_lock
    }

    fn digger_lock(&self) -> LockOwner {
        self.digger_lock
    }

    fn claim_gear_lock(&mut self, owner: LockOwner) -> bool {
        if !self.gear_lock.available_to(owner) {
            return false;
        }
        if self.gear_lock != owner {
            self.saved_gear.clone_from(&self.equipped_gear);
            self.gear_lock = owner;
        }
        true
    }

    fn claim_digger_lock(&mut self, owner: LockOwner) -> bool {
        if !self.digger_lock.available_to(owner) {
            return false;
        }
        if self.digger_lock != owner {
            self.saved_diggers.clone_from(&self.active_diggers);
            self.digger_lock = owner;
        }
        true
    }

    fn release_gear_lock(&mut self, owner: LockOwner) {
        if owner != LockOwner::None && self.gear_lock == owner {
            self.gear_lock = LockOwner::None;
            self.equipped_gear = std::mem::take(&mut self.saved_gear);
        }
    }

    fn release_digger_lock(&mut self, owner: LockOwner) {
        if owner != LockOwner::None && self.digger_lock == owner {
            self.digger_lock = LockOwner::None;
            self.active_diggers = std::mem::take(&mut self.saved_diggers);
        }
    }

    fn equip_gear(&mut self, items: &[u32]) {
        self.equipped_gear = items.to_vec();
    }

    fn diggers_available(&self) -> bool {
        self.diggers_available
    }

    fn equip_diggers(&mut self, diggers: &[u32]) -> bool {
        if !self.diggers_available {
            return false;
        }
        self.active_diggers = diggers.to_vec();
        true
    }

    fn digger_count(&self) -> usize {
        self.digger_costs.len()
    }

    fn digger_upgrade_cost(&self, digger: usize) -> f64 {
        self.digger_costs
            .get(digger)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    fn upgrade_digger(&mut self, digger: usize) {
        if let Some(cost) = self.digger_costs.get_mut(digger) {
            self.gold -= *cost;
            *cost *= 2.0;
            self.digger_upgrades = self.digger_upgrades.saturating_add(1);
        }
    }

    fn set_os(&mut self, os: OsVariant) -> bool {
        if !self.os_available.contains(&os) {
            return false;
        }
        self.os = Some(os);
        true
    }

    fn set_ngu_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if difficulty > self.difficulty {
            return false;
        }
        self.ngu_diff = difficulty;
        true
    }

    fn consume(&mut self, item: &str, quantity: u32) -> bool {
        if self.out_of_stock.contains(item) {
            return false;
        }
        self.consumed.push((item.to_owned(), quantity));
        true
    }
}

impl RebirthControls for SandboxHost {
    fn min_rebirth_seconds(&self) -> f64 {
        self.min_rebirth_seconds
    }

    fn in_challenge(&self) -> bool {
        self.current_challenge.is_some()
    }

    fn in_challenge_kind(&self, kind: ChallengeKind) -> bool {
        self.current_challenge == Some(kind)
    }

    fn challenge_completions(&self, kind: ChallengeKind) -> u32 {
        self.completions.get(&kind).copied().unwrap_or(0)
    }

    fn challenge_max_completions(&self, _kind: ChallengeKind) -> u32 {
        self.max_completions
    }

    fn number_bonus_ratio(&self) -> f64 {
        self.number_ratio
    }

    fn additional_bosses_reachable(&self) -> f64 {
        self.bosses_reachable
    }

    fn optimal_rebirth_minutes(&self, balanced: bool) -> Option<f64> {
        if balanced {
            self.optimal_minutes_balanced
        } else {
            self.optimal_minutes
        }
    }

    fn any_harvestable(&self) -> bool {
        self.harvestable
    }

    fn harvest_all(&mut self) {
        if self.harvestable {
            self.harvestable = false;
            self.harvests = self.harvests.saturating_add(1);
        }
    }

    fn blood(&self) -> f64 {
        self.blood
    }

    fn cast_spell(&mut self, spell: BloodSpell, for_rebirth: bool) {
        self.blood = match spell {
            BloodSpell::RebirthNumber => 0.0,
            BloodSpell::GuffB | BloodSpell::GuffA | BloodSpell::IronPill => {
                (self.blood - self.spell_cost).max(0.0)
            }
        };
        self.spells_cast.push((spell, for_rebirth));
    }

    fn engage_rebirth(&mut self) -> bool {
        if self.refuse_rebirth {
            return false;
        }
        self.rebirths = self.rebirths.saturating_add(1);
        self.current_challenge = None;
        self.reset_run();
        true
    }

    fn engage_challenge(&mut self, kind: ChallengeKind) -> bool {
        if self.refuse_rebirth {
            return false;
        }
        self.rebirths = self.rebirths.saturating_add(1);
        self.current_challenge = Some(kind);
        self.reset_run();
        true
    }
}
