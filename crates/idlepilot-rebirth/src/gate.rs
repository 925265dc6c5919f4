//! The pre-rebirth gate and blood maintenance.
//!
//! Before committing a rebirth the gate spends what the current run would
//! otherwise lose: it harvests yggdrasil fruit (deferring a cycle so fruit
//! effects land), buys digger levels with spare gold, and converts blood
//! into spells, ending with the rebirth number spell.

use serde::Serialize;
use tracing::{debug, info, warn};

use idlepilot_profile::RebirthPlan;
use idlepilot_types::{BloodSpell, GameStatus, Loadouts, LockOwner, RebirthControls};

/// Diggers equipped while harvesting yggdrasil fruit.
pub const YGGDRASIL_DIGGERS: [u32; 2] = [8, 11];

/// Blood maintenance is skipped within this many seconds of an armed time
/// rebirth, saving blood for the gate.
pub const BLOOD_RESERVE_WINDOW_SECONDS: f64 = 30.0 * 60.0;

/// Upper bound on digger levels bought in one gate pass.
const MAX_DIGGER_UPGRADES: usize = 10_000;

/// Maintenance spells, in casting order.
const MAINTENANCE_SPELLS: [BloodSpell; 3] =
    [BloodSpell::GuffB, BloodSpell::GuffA, BloodSpell::IronPill];

/// Settings that shape the gate and blood maintenance.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebirthOptions {
    /// Rebirths are committed automatically.
    pub auto_rebirth: bool,
    /// Blood spells may be cast.
    pub cast_blood_spells: bool,
    /// Harvest yggdrasil fruit before rebirthing.
    pub manage_yggdrasil: bool,
    /// Swap into the yggdrasil gear and digger loadouts before harvesting.
    pub swap_yggdrasil_loadouts: bool,
    /// Gear item ids worn while harvesting.
    pub yggdrasil_loadout: Vec<u32>,
    /// Buy digger levels before rebirthing.
    pub upgrade_diggers: bool,
    /// Gold kept in reserve when buying digger levels.
    pub digger_gold_threshold: f64,
}

/// A step of the pre-rebirth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateStep {
    /// Yggdrasil harvest, with optional loadout swap.
    Yggdrasil,
    /// Digger level purchases.
    Diggers,
    /// Blood spells before rebirth.
    BloodSpells,
}

/// Why the gate held a rebirth back this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeferReason {
    /// A gear or digger lock is held by another owner.
    LoadoutLocked,
    /// Fruit was just harvested; its effects land next cycle.
    FruitHarvested,
}

/// Result of one gate pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    /// Steps that ran, in order.
    pub steps: Vec<GateStep>,
    /// Set when the gate deferred the rebirth.
    pub deferred: Option<DeferReason>,
}

impl GateReport {
    /// Whether the rebirth may be committed.
    pub const fn proceed(&self) -> bool {
        self.deferred.is_none()
    }
}

/// Run the pre-rebirth gate.
pub fn run_gate<H>(host: &mut H, options: &RebirthOptions) -> GateReport
where
    H: GameStatus + Loadouts + RebirthControls + ?Sized,
{
    let mut report = GateReport {
        steps: vec![GateStep::Yggdrasil],
        deferred: None,
    };

    if let Some(reason) = harvest_yggdrasil(host, options) {
        report.deferred = Some(reason);
        return report;
    }

    report.steps.push(GateStep::Diggers);
    if options.upgrade_diggers {
        upgrade_cheapest_diggers(host, options.digger_gold_threshold);
    }

    report.steps.push(GateStep::BloodSpells);
    if options.cast_blood_spells {
        cast_rebirth_spells(host);
    }

    report
}

fn harvest_yggdrasil<H>(host: &mut H, options: &RebirthOptions) -> Option<DeferReason>
where
    H: Loadouts + RebirthControls + ?Sized,
{
    if !options.manage_yggdrasil {
        return None;
    }

    if !host.any_harvestable() {
        // A previous pass swapped loadouts for the harvest.
        host.release_gear_lock(LockOwner::Yggdrasil);
        host.release_digger_lock(LockOwner::Yggdrasil);
        return None;
    }

    let swap = options.swap_yggdrasil_loadouts && !options.yggdrasil_loadout.is_empty();
    if swap && !swap_into_yggdrasil_loadout(host, &options.yggdrasil_loadout) {
        warn!("Delaying rebirth to wait for yggdrasil loadout and diggers");
        return Some(DeferReason::LoadoutLocked);
    }

    host.harvest_all();
    info!("Delaying rebirth one cycle to allow fruit effects");
    Some(DeferReason::FruitHarvested)
}

fn swap_into_yggdrasil_loadout<H>(host: &mut H, loadout: &[u32]) -> bool
where
    H: Loadouts + ?Sized,
{
    let gear_owned = host.gear_lock() == LockOwner::Yggdrasil;
    if !gear_owned {
        if !host.claim_gear_lock(LockOwner::Yggdrasil) {
            return false;
        }
        host.equip_gear(loadout);
    }

    let diggers_owned = host.digger_lock() == LockOwner::Yggdrasil;
    if !diggers_owned {
        if !host.claim_digger_lock(LockOwner::Yggdrasil) {
            host.release_gear_lock(LockOwner::Yggdrasil);
            return false;
        }
        host.equip_diggers(&YGGDRASIL_DIGGERS);
    }
    true
}

/// Buy digger levels, cheapest first, while the cost plus `threshold` stays
/// below available gold. Returns the number of levels bought.
pub fn upgrade_cheapest_diggers<H>(host: &mut H, threshold: f64) -> usize
where
    H: GameStatus + Loadouts + ?Sized,
{
    let mut bought: usize = 0;
    while bought < MAX_DIGGER_UPGRADES {
        let Some((digger, cost)) = (0..host.digger_count())
            .map(|d| (d, host.digger_upgrade_cost(d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            break;
        };
        let affordable = cost + threshold < host.gold();
        if !affordable {
            break;
        }
        info!(digger, cost, "Upgrading digger");
        host.upgrade_digger(digger);
        bought = bought.saturating_add(1);
    }
    bought
}

/// Cast every spell that helps the next run, then put the remaining blood
/// into the rebirth number spell.
fn cast_rebirth_spells<H>(host: &mut H)
where
    H: RebirthControls + ?Sized,
{
    for spell in MAINTENANCE_SPELLS {
        if host.blood() > 0.0 {
            host.cast_spell(spell, true);
        }
    }
    let blood = host.blood();
    if blood > 0.0 {
        info!(blood, "Casting number spell with remaining blood before rebirth");
        host.cast_spell(BloodSpell::RebirthNumber, true);
    }
}

/// Routine blood spell casting between rebirths.
///
/// Skipped when blood spells are disabled, and within
/// [`BLOOD_RESERVE_WINDOW_SECONDS`] of an armed automatic time rebirth.
/// Returns whether spells were cast.
pub fn run_blood_maintenance<H>(host: &mut H, plan: &RebirthPlan, options: &RebirthOptions) -> bool
where
    H: GameStatus + RebirthControls + ?Sized,
{
    if !options.cast_blood_spells {
        return false;
    }
    if let Some(at) = plan.armed_time().filter(|_| options.auto_rebirth) {
        let remaining = at - host.elapsed_seconds();
        if remaining < BLOOD_RESERVE_WINDOW_SECONDS {
            debug!(remaining, "Saving blood for rebirth");
            return false;
        }
    }

    for spell in MAINTENANCE_SPELLS {
        host.cast_spell(spell, false);
    }
    true
}
