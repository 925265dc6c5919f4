//! Integration tests for the full engine cycle.
//!
//! Every test drives an [`Autopilot`] against a [`SandboxHost`] through the
//! public phase methods, with profiles parsed from JSON the way they are
//! read from disk.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use idlepilot_core::config::AutomationSettings;
use idlepilot_core::cycle::Phase;
use idlepilot_core::engine::Autopilot;
use idlepilot_core::latch::LatchOutcome;
use idlepilot_core::state::LatchChannel;
use idlepilot_profile::{EMPTY_TEMPLATE, Profile};
use idlepilot_rebirth::{DeferReason, RebirthKind, RebirthOutcome};
use idlepilot_sandbox::{SandboxHost, SandboxRitual};
use idlepilot_types::{Channel, ResourcePools, TargetKind};

const PROFILE: &str = r#"{
  "Breakpoints": {
    "Energy": [
      { "Time": 0, "Priorities": ["CAPAUG-0", "NGU-0"] },
      { "Time": { "m": 10 }, "Priorities": ["NGU-1", "NGU-2"] }
    ],
    "Magic": [ { "Time": 0, "Priorities": ["NGU-0"] } ],
    "R3": [ { "Time": 0, "Priorities": ["HACK-0", "HACK-1"] } ],
    "Gear": [ { "Time": 0, "ID": [5, 6] } ],
    "Consumables": [ { "Time": 0, "Items": ["EPOT-A:2"] } ],
    "Rebirth": { "Type": "TIME", "Target": 1200 }
  }
}"#;

fn host() -> SandboxHost {
    let mut host = SandboxHost::new()
        .with_pool(Channel::Energy, 100)
        .with_pool(Channel::Magic, 50)
        .with_pool(Channel::R3, 10)
        .with_cap(Channel::Energy, TargetKind::Augment { index: 0 }, 30);
    host.elapsed = 100.0;
    host
}

fn pilot(settings: AutomationSettings) -> Autopilot<SandboxHost> {
    Autopilot::new(host(), settings)
        .unwrap()
        .with_profile(Profile::parse(PROFILE).unwrap())
}

fn expected(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
    entries.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
}

fn temp_profile(name: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("idlepilot-core-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("profile.json");
    let _ = std::fs::remove_file(&path);
    (dir, path)
}

#[test]
fn cycle_allocates_every_channel() {
    let mut pilot = pilot(AutomationSettings::default());
    let report = pilot.run_cycle();

    assert!(report.failures.is_empty());
    assert_eq!(report.allocations.len(), 3);
    let host = pilot.host();
    assert_eq!(
        host.allocations(Channel::Energy),
        expected(&[("AUG-0", 30), ("NGU-0", 70)])
    );
    assert_eq!(host.allocations(Channel::Magic), expected(&[("NGU-0", 50)]));
    assert_eq!(
        host.allocations(Channel::R3),
        expected(&[("HACK-0", 5), ("HACK-1", 5)])
    );
    for channel in Channel::ALL {
        assert_eq!(host.refreshes(channel), 1);
    }
}

#[test]
fn second_cycle_without_changes_allocates_nothing_new() {
    let mut pilot = pilot(AutomationSettings::default());
    pilot.run_cycle();
    let before: Vec<_> = Channel::ALL
        .iter()
        .map(|c| pilot.host().allocations(*c))
        .collect();

    pilot.run_cycle();
    let after: Vec<_> = Channel::ALL
        .iter()
        .map(|c| pilot.host().allocations(*c))
        .collect();
    assert_eq!(before, after);
    for channel in Channel::ALL {
        assert_eq!(pilot.host().idle(channel), 0);
    }
}

#[test]
fn breakpoint_switch_moves_the_pointer() {
    let mut pilot = pilot(AutomationSettings::default());
    pilot.run_cycle();
    assert_eq!(pilot.state().pointer(Channel::Energy), Some(0.0));

    pilot.host_mut().elapsed = 700.0;
    pilot.run_cycle();
    assert_eq!(pilot.state().pointer(Channel::Energy), Some(600.0));
    assert_eq!(
        pilot.host().allocations(Channel::Energy),
        expected(&[("NGU-1", 50), ("NGU-2", 50)])
    );
}

#[test]
fn latches_apply_once() {
    let mut pilot = pilot(AutomationSettings::default());
    let report = pilot.run_cycle();
    assert!(
        report
            .latches
            .contains(&(LatchChannel::Gear, LatchOutcome::Applied))
    );
    assert_eq!(pilot.host().equipped_gear, vec![5, 6]);
    assert_eq!(pilot.host().consumed, vec![("EPOT-A".to_owned(), 2)]);

    pilot.host_mut().equipped_gear.clear();
    pilot.run_cycle();
    assert!(pilot.host().equipped_gear.is_empty());
    assert_eq!(pilot.host().consumed.len(), 1);
}

#[test]
fn unmanaged_channels_are_left_alone() {
    let settings = AutomationSettings {
        manage_magic: false,
        manage_gear: false,
        ..AutomationSettings::default()
    };
    let mut pilot = pilot(settings);
    pilot.run_cycle();
    assert!(pilot.host().allocations(Channel::Magic).is_empty());
    assert_eq!(pilot.host().refreshes(Channel::Magic), 0);
    assert!(pilot.host().equipped_gear.is_empty());
}

#[test]
fn committed_rebirth_resets_engine_state() {
    let settings = AutomationSettings {
        auto_rebirth: true,
        ..AutomationSettings::default()
    };
    let mut pilot = pilot(settings);
    pilot.run_cycle();
    assert_eq!(pilot.state().consumed_len(), 1);

    pilot.host_mut().elapsed = 1300.0;
    let report = pilot.run_cycle();
    assert_eq!(
        report.rebirth,
        Some(RebirthOutcome::Committed(RebirthKind::Plain))
    );
    assert!(report.rebirthed());
    assert_eq!(pilot.host().rebirths, 1);
    assert_eq!(pilot.state().pointer(Channel::Energy), None);
    assert_eq!(pilot.state().consumed_len(), 0);

    // The new run consumes again and re-equips gear.
    pilot.host_mut().equipped_gear.clear();
    pilot.run_cycle();
    assert_eq!(pilot.host().consumed.len(), 2);
    assert_eq!(pilot.host().equipped_gear, vec![5, 6]);
}

#[test]
fn yggdrasil_harvest_defers_rebirth_one_cycle() {
    let settings = AutomationSettings {
        auto_rebirth: true,
        manage_yggdrasil: true,
        ..AutomationSettings::default()
    };
    let mut pilot = pilot(settings);
    pilot.host_mut().elapsed = 1300.0;
    pilot.host_mut().harvestable = true;

    let first = pilot.run_cycle();
    assert_eq!(
        first.rebirth,
        Some(RebirthOutcome::Deferred(DeferReason::FruitHarvested))
    );
    assert_eq!(pilot.host().harvests, 1);

    let second = pilot.run_cycle();
    assert!(second.rebirthed());
}

#[test]
fn blood_maintenance_saves_blood_near_armed_rebirth() {
    let settings = AutomationSettings {
        auto_rebirth: true,
        cast_blood_spells: true,
        ..AutomationSettings::default()
    };
    let mut saving = pilot(settings);
    // 1100 seconds before the 1200 second rebirth.
    assert!(!saving.run_pre_commit_resource_maintenance());
    assert!(saving.host().spells_cast.is_empty());

    let settings = AutomationSettings {
        cast_blood_spells: true,
        ..AutomationSettings::default()
    };
    let mut casting = pilot(settings);
    assert!(casting.run_pre_commit_resource_maintenance());
    assert_eq!(casting.host().spells_cast.len(), 3);
}

#[test]
fn ritual_deadlines_come_from_the_next_breakpoint() {
    let with_next = r#"{ "Breakpoints": { "Magic": [
        { "Time": 0, "Priorities": ["BR"] },
        { "Time": 200, "Priorities": ["BR"] }
    ] } }"#;
    let without_next = r#"{ "Breakpoints": { "Magic": [
        { "Time": 0, "Priorities": ["BR"] }
    ] } }"#;

    for (profile, committed) in [(with_next, 0), (without_next, 1000)] {
        let mut host = SandboxHost::new().with_pool(Channel::Magic, 1000);
        host.elapsed = 100.0;
        host.magic_power = 0.002;
        host.rituals = vec![SandboxRitual::with_cap(1000)];
        host.rituals_unlocked = 1;
        let mut pilot = Autopilot::new(host, AutomationSettings::default())
            .unwrap()
            .with_profile(Profile::parse(profile).unwrap());

        pilot.run_allocation_cycle();
        // Roughly 500 seconds to complete: past 200, inside the hour.
        assert_eq!(pilot.host().rituals[0].committed, committed);
    }
}

#[test]
fn non_finite_elapsed_fails_phases_without_stopping_the_cycle() {
    let settings = AutomationSettings {
        auto_rebirth: true,
        ..AutomationSettings::default()
    };
    let mut pilot = pilot(settings);
    pilot.host_mut().elapsed = f64::NAN;

    let report = pilot.run_cycle();
    assert_eq!(report.elapsed, None);
    assert!(report.allocations.is_empty());
    for channel in Channel::ALL {
        assert!(report.failures.contains(&Phase::Allocate(channel)));
    }
    for channel in LatchChannel::ALL {
        assert!(report.failures.contains(&Phase::Latch(channel)));
    }
    assert!(report.failures.contains(&Phase::BloodMaintenance));
    assert!(report.failures.contains(&Phase::RebirthCheck));
    assert_eq!(pilot.host().rebirths, 0);

    pilot.host_mut().elapsed = 100.0;
    let report = pilot.run_cycle();
    assert!(report.failures.is_empty());
    assert_eq!(report.allocations.len(), 3);
}

#[test]
fn malformed_profile_leaves_an_empty_disabled_engine() {
    let (dir, path) = temp_profile("malformed");
    std::fs::write(&path, r#"{"Breakpoints": {"Energy": [ {"Time": 0, "Prio"#).unwrap();

    let settings = AutomationSettings {
        auto_rebirth: true,
        ..AutomationSettings::default()
    };
    let mut pilot = pilot(settings);
    pilot.run_cycle();
    assert_eq!(pilot.state().pointer(Channel::Energy), Some(0.0));

    pilot.reload_profile(&path);
    assert_eq!(*pilot.profile(), Profile::empty());
    assert!(pilot.profile().rebirth.is_disabled());
    assert_eq!(pilot.state().pointer(Channel::Energy), None);

    pilot.host_mut().elapsed = 5000.0;
    let report = pilot.run_cycle();
    assert!(report.failures.is_empty());
    assert_eq!(report.rebirth, Some(RebirthOutcome::NotEligible));
    assert!(
        report
            .allocations
            .iter()
            .all(|(_, allocation)| allocation.allocated.is_empty())
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_profile_is_created_and_loaded() {
    let (dir, path) = temp_profile("missing");
    let mut pilot = Autopilot::new(host(), AutomationSettings::default()).unwrap();

    pilot.reload_profile(&path);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EMPTY_TEMPLATE);
    assert_eq!(pilot.store().source, path);
    assert_eq!(pilot.profile().energy.len(), 1);

    let report = pilot.run_cycle();
    assert!(report.failures.is_empty());
    assert!(pilot.host().allocations(Channel::Energy).is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reload_keeps_consumables_from_being_reused() {
    let (dir, path) = temp_profile("reload");
    std::fs::write(&path, PROFILE).unwrap();

    let mut pilot = Autopilot::new(host(), AutomationSettings::default()).unwrap();
    pilot.reload_profile(&path);
    pilot.run_cycle();
    pilot.reload_profile(&path);
    pilot.run_cycle();

    assert_eq!(pilot.host().consumed, vec![("EPOT-A".to_owned(), 2)]);
    std::fs::remove_dir_all(&dir).unwrap();
}
