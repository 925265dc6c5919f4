//! Error types for the idlepilot binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run, so
//! `main` can propagate with `?`.

/// Top-level error for the idlepilot binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Settings loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: idlepilot_core::config::ConfigError,
    },

    /// The host failed its startup probe.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying engine error.
        #[from]
        source: idlepilot_core::engine::CoreError,
    },

    /// The `sandbox` settings section could not be read.
    #[error("sandbox config error: {message}")]
    Sandbox {
        /// Description of the failure.
        message: String,
    },

    /// The final cycle report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
