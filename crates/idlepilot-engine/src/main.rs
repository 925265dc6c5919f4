//! Idlepilot binary.
//!
//! Loads settings and the breakpoint profile, binds the engine to a host,
//! and runs the cycle loop until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load settings from `idlepilot.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the sandbox host from the `sandbox` section
//! 4. Probe the host and create the engine
//! 5. Load the profile (created from the template when missing)
//! 6. Run the cycle loop until shutdown
//! 7. Log the result

mod error;
mod sandbox;

use std::path::Path;

use idlepilot_core::config::AutomationSettings;
use idlepilot_core::engine::Autopilot;
use idlepilot_core::runner;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::sandbox::SandboxClock;

/// Settings file, relative to the working directory.
const SETTINGS_PATH: &str = "idlepilot.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or the host fails its
/// startup probe.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load settings. Logging is not up yet, so this only reports errors
    //    through the return value.
    let settings_path = Path::new(SETTINGS_PATH);
    let settings = load_settings(settings_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the settings.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_target(true)
        .init();

    info!("idlepilot-engine starting");
    if !settings_path.exists() {
        info!("Settings file not found, using defaults");
    }
    info!(
        profile = %settings.profile_path.display(),
        cycle_interval_ms = settings.cycle_interval_ms,
        auto_rebirth = settings.auto_rebirth,
        cast_blood_spells = settings.cast_blood_spells,
        "Settings loaded"
    );

    // 3. Build the host.
    let sandbox_config = sandbox::load_sandbox_config(settings_path)?;
    let host = sandbox::build_host(&sandbox_config);

    // 4. Probe the host and create the engine.
    let profile_path = settings.profile_path.clone();
    let mut autopilot = Autopilot::new(host, settings).map_err(EngineError::from)?;

    // 5. Load the profile.
    autopilot.reload_profile(&profile_path);
    info!(
        loaded_at = %autopilot.store().loaded_at,
        "Profile ready"
    );

    // 6. Run until Ctrl-C.
    let mut clock = SandboxClock::new(sandbox_config.seconds_per_cycle);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    };
    let summary = runner::run_autopilot(&mut autopilot, &mut clock, None, shutdown).await;

    // 7. Log the result.
    if let Some(report) = &summary.last_report {
        let json = serde_json::to_string(report).map_err(EngineError::from)?;
        info!(report = %json, "Last cycle");
    }
    info!(
        cycles = summary.cycles,
        rebirths = summary.rebirths,
        "idlepilot-engine stopped"
    );
    Ok(())
}

/// Load settings from `path`, or defaults when the file does not exist.
fn load_settings(path: &Path) -> Result<AutomationSettings, EngineError> {
    if path.exists() {
        Ok(AutomationSettings::from_file(path)?)
    } else {
        let mut settings = AutomationSettings::default();
        settings.apply_env_overrides();
        Ok(settings)
    }
}
