//! Integration tests for the async cycle loop.

#![allow(clippy::unwrap_used)]

use idlepilot_core::config::AutomationSettings;
use idlepilot_core::cycle::CycleReport;
use idlepilot_core::engine::Autopilot;
use idlepilot_core::runner::{CycleCallback, NoOpCallback, StopReason, run_autopilot};
use idlepilot_profile::Profile;
use idlepilot_sandbox::SandboxHost;
use idlepilot_types::Channel;

const PROFILE: &str = r#"{
  "Breakpoints": {
    "Energy": [ { "Time": 0, "Priorities": ["NGU-0"] } ],
    "Rebirth": { "Type": "TIME", "Target": 300 }
  }
}"#;

fn fast_settings() -> AutomationSettings {
    AutomationSettings {
        auto_rebirth: true,
        cycle_interval_ms: 1,
        ..AutomationSettings::default()
    }
}

/// Advances host time by a fixed step after every cycle.
struct Clock {
    step: f64,
    seen: Vec<u64>,
}

impl CycleCallback<SandboxHost> for Clock {
    fn on_cycle(&mut self, cycle: u64, _report: &CycleReport, host: &mut SandboxHost) {
        self.seen.push(cycle);
        host.advance(self.step);
    }
}

#[tokio::test]
async fn stops_at_the_cycle_limit() {
    let host = SandboxHost::new().with_pool(Channel::Energy, 10);
    let mut pilot = Autopilot::new(host, fast_settings())
        .unwrap()
        .with_profile(Profile::parse(PROFILE).unwrap());

    let never = std::future::pending::<()>();
    let summary = run_autopilot(&mut pilot, &mut NoOpCallback, Some(3), never).await;

    assert_eq!(summary.stop_reason, StopReason::CycleLimit);
    assert_eq!(summary.cycles, 3);
    assert_eq!(pilot.host().refreshes(Channel::Energy), 3);
    assert!(summary.last_report.is_some());
}

#[tokio::test]
async fn callback_drives_time_into_a_rebirth() {
    let mut host = SandboxHost::new().with_pool(Channel::Energy, 10);
    host.min_rebirth_seconds = 60.0;
    let mut pilot = Autopilot::new(host, fast_settings())
        .unwrap()
        .with_profile(Profile::parse(PROFILE).unwrap());
    let mut clock = Clock {
        step: 100.0,
        seen: Vec::new(),
    };

    // Elapsed 0, 100, 200, 300: the fourth cycle rebirths.
    let summary = run_autopilot(&mut pilot, &mut clock, Some(4), std::future::pending()).await;

    assert_eq!(clock.seen, vec![1, 2, 3, 4]);
    assert_eq!(summary.rebirths, 1);
    assert!(summary.last_report.unwrap().rebirthed());
    assert_eq!(pilot.host().rebirths, 1);
}

#[tokio::test]
async fn shutdown_stops_the_loop() {
    let mut pilot = Autopilot::new(SandboxHost::new(), fast_settings()).unwrap();

    let summary = run_autopilot(&mut pilot, &mut NoOpCallback, None, async {}).await;

    assert_eq!(summary.stop_reason, StopReason::Shutdown);
    assert_eq!(summary.cycles, 0);
}
