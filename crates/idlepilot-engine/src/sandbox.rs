//! The demo host the binary drives.
//!
//! Without a live game to attach to, the binary runs the engine against a
//! [`SandboxHost`] shaped by the optional `sandbox` section of
//! `idlepilot.yaml`, and advances its clock after every cycle.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use idlepilot_core::cycle::CycleReport;
use idlepilot_core::runner::CycleCallback;
use idlepilot_sandbox::{SandboxHost, SandboxRitual};
use idlepilot_types::Channel;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Shape of the demo host, loaded from the `sandbox` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SandboxConfig {
    /// Energy pool size.
    #[serde(default = "default_energy")]
    pub energy: u64,

    /// Magic pool size.
    #[serde(default = "default_magic")]
    pub magic: u64,

    /// R3 pool size.
    #[serde(default = "default_r3")]
    pub r3: u64,

    /// Number of unlocked ritual slots.
    #[serde(default = "default_rituals")]
    pub rituals: usize,

    /// Magic capacity of every ritual slot.
    #[serde(default = "default_ritual_cap")]
    pub ritual_cap: u64,

    /// Host minimum rebirth time in seconds.
    #[serde(default = "default_min_rebirth_seconds")]
    pub min_rebirth_seconds: f64,

    /// Game seconds that pass per cycle.
    #[serde(default = "default_seconds_per_cycle")]
    pub seconds_per_cycle: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            energy: default_energy(),
            magic: default_magic(),
            r3: default_r3(),
            rituals: default_rituals(),
            ritual_cap: default_ritual_cap(),
            min_rebirth_seconds: default_min_rebirth_seconds(),
            seconds_per_cycle: default_seconds_per_cycle(),
        }
    }
}

const fn default_energy() -> u64 {
    1_000_000
}

const fn default_magic() -> u64 {
    500_000
}

const fn default_r3() -> u64 {
    10_000
}

const fn default_rituals() -> usize {
    4
}

const fn default_ritual_cap() -> u64 {
    100_000
}

const fn default_min_rebirth_seconds() -> f64 {
    180.0
}

const fn default_seconds_per_cycle() -> f64 {
    10.0
}

/// Read the `sandbox` section of the settings file, if there is one.
pub fn load_sandbox_config(path: &Path) -> Result<SandboxConfig, EngineError> {
    if !path.exists() {
        return Ok(SandboxConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Sandbox {
        message: format!("failed to read settings file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Sandbox {
        message: format!("failed to parse settings YAML: {e}"),
    })?;

    raw.get("sandbox").map_or_else(
        || Ok(SandboxConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Sandbox {
                message: format!("invalid sandbox section: {e}"),
            })
        },
    )
}

/// Build the demo host.
pub fn build_host(config: &SandboxConfig) -> SandboxHost {
    let mut host = SandboxHost::new()
        .with_pool(Channel::Energy, config.energy)
        .with_pool(Channel::Magic, config.magic)
        .with_pool(Channel::R3, config.r3);
    host.min_rebirth_seconds = config.min_rebirth_seconds;
    host.rituals = (0..config.rituals)
        .map(|_| SandboxRitual::with_cap(config.ritual_cap))
        .collect();
    host.rituals_unlocked = config.rituals;
    info!(
        energy = config.energy,
        magic = config.magic,
        r3 = config.r3,
        rituals = config.rituals,
        "Sandbox host ready"
    );
    host
}

// -----------------------------------------------------------------------
// Clock
// -----------------------------------------------------------------------

/// Advances the sandbox clock after every cycle.
pub struct SandboxClock {
    seconds_per_cycle: f64,
}

impl SandboxClock {
    /// A clock advancing `seconds_per_cycle` game seconds per cycle.
    pub const fn new(seconds_per_cycle: f64) -> Self {
        Self { seconds_per_cycle }
    }
}

impl CycleCallback<SandboxHost> for SandboxClock {
    fn on_cycle(&mut self, cycle: u64, report: &CycleReport, host: &mut SandboxHost) {
        debug!(
            cycle,
            elapsed = host.elapsed,
            failures = report.failures.len(),
            rebirth = ?report.rebirth,
            "Cycle complete"
        );
        host.advance(self.seconds_per_cycle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use idlepilot_types::ResourcePools;

    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_sandbox_config(Path::new("/nonexistent/idlepilot.yaml")).unwrap();
        assert_eq!(config, SandboxConfig::default());
    }

    #[test]
    fn reads_the_sandbox_section_only() {
        let dir = std::env::temp_dir().join(format!("idlepilot-engine-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("idlepilot.yaml");
        std::fs::write(
            &path,
            "auto_rebirth: true\nsandbox:\n  energy: 42\n  rituals: 2\n",
        )
        .unwrap();

        let config = load_sandbox_config(&path).unwrap();
        assert_eq!(config.energy, 42);
        assert_eq!(config.rituals, 2);
        assert_eq!(config.magic, default_magic());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn host_matches_config() {
        let config = SandboxConfig {
            energy: 7,
            rituals: 3,
            ..SandboxConfig::default()
        };
        let host = build_host(&config);
        assert_eq!(host.idle(Channel::Energy), 7);
        assert_eq!(host.rituals.len(), 3);
        assert_eq!(host.min_rebirth_seconds, 180.0);
    }
}
