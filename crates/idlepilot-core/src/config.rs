//! Automation settings loading.
//!
//! Settings live in `idlepilot.yaml` next to the binary. Every field has a
//! default, so an empty or partial file is valid. The profile path can be
//! overridden with the `IDLEPILOT_PROFILE` environment variable.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use idlepilot_rebirth::RebirthOptions;
use idlepilot_types::Channel;

/// Environment variable that overrides [`AutomationSettings::profile_path`].
pub const PROFILE_ENV_VAR: &str = "IDLEPILOT_PROFILE";

/// Errors that can occur when loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse settings YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level automation settings.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutomationSettings {
    /// Master switch. When off, cycles do nothing.
    #[serde(default = "default_true")]
    pub global_enabled: bool,

    /// Commit rebirths automatically when the profile's condition holds.
    #[serde(default)]
    pub auto_rebirth: bool,

    /// Cast blood spells during maintenance and before rebirth.
    #[serde(default)]
    pub cast_blood_spells: bool,

    /// Allocate energy.
    #[serde(default = "default_true")]
    pub manage_energy: bool,

    /// Allocate magic.
    #[serde(default = "default_true")]
    pub manage_magic: bool,

    /// Allocate R3.
    #[serde(default = "default_true")]
    pub manage_r3: bool,

    /// Apply gear loadout breakpoints.
    #[serde(default = "default_true")]
    pub manage_gear: bool,

    /// Apply digger breakpoints.
    #[serde(default = "default_true")]
    pub manage_diggers: bool,

    /// Apply wandoos OS breakpoints.
    #[serde(default = "default_true")]
    pub manage_wandoos: bool,

    /// Apply NGU difficulty breakpoints.
    #[serde(default = "default_true")]
    pub manage_ngu_diff: bool,

    /// Apply consumable breakpoints.
    #[serde(default = "default_true")]
    pub manage_consumables: bool,

    /// Harvest yggdrasil before rebirthing.
    #[serde(default)]
    pub manage_yggdrasil: bool,

    /// Swap into the yggdrasil loadout before harvesting.
    #[serde(default)]
    pub swap_yggdrasil_loadouts: bool,

    /// Gear item ids worn while harvesting.
    #[serde(default)]
    pub yggdrasil_loadout: Vec<u32>,

    /// Buy digger levels before rebirthing.
    #[serde(default)]
    pub upgrade_diggers: bool,

    /// Gold kept in reserve when buying digger levels.
    #[serde(default)]
    pub digger_gold_threshold: f64,

    /// Profile file path.
    #[serde(default = "default_profile_path")]
    pub profile_path: PathBuf,

    /// Milliseconds between cycles.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            auto_rebirth: false,
            cast_blood_spells: false,
            manage_energy: true,
            manage_magic: true,
            manage_r3: true,
            manage_gear: true,
            manage_diggers: true,
            manage_wandoos: true,
            manage_ngu_diff: true,
            manage_consumables: true,
            manage_yggdrasil: false,
            swap_yggdrasil_loadouts: false,
            yggdrasil_loadout: Vec::new(),
            upgrade_diggers: false,
            digger_gold_threshold: 0.0,
            profile_path: default_profile_path(),
            cycle_interval_ms: default_cycle_interval_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AutomationSettings {
    /// Load settings from a YAML file at the given path.
    ///
    /// `IDLEPILOT_PROFILE` overrides `profile_path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut settings: Self = serde_yml::from_str(yaml)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.override_profile_path(std::env::var(PROFILE_ENV_VAR).ok());
    }

    /// Replace the profile path with `value` when it is set and not blank.
    pub fn override_profile_path(&mut self, value: Option<String>) {
        if let Some(path) = value.filter(|v| !v.trim().is_empty()) {
            self.profile_path = PathBuf::from(path);
        }
    }

    /// Whether allocation of `channel` is enabled.
    pub const fn manages(&self, channel: Channel) -> bool {
        match channel {
            Channel::Energy => self.manage_energy,
            Channel::Magic => self.manage_magic,
            Channel::R3 => self.manage_r3,
        }
    }

    /// The subset of settings the rebirth engine reads.
    pub fn rebirth_options(&self) -> RebirthOptions {
        RebirthOptions {
            auto_rebirth: self.auto_rebirth,
            cast_blood_spells: self.cast_blood_spells,
            manage_yggdrasil: self.manage_yggdrasil,
            swap_yggdrasil_loadouts: self.swap_yggdrasil_loadouts,
            yggdrasil_loadout: self.yggdrasil_loadout.clone(),
            upgrade_diggers: self.upgrade_diggers,
            digger_gold_threshold: self.digger_gold_threshold,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

fn default_profile_path() -> PathBuf {
    PathBuf::from("profile.json")
}

const fn default_cycle_interval_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
