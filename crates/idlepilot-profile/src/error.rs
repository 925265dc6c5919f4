//! Error types for profile loading.

/// Errors that can occur when reading or parsing a profile file.
///
/// These never escape [`ProfileStore::load`](crate::ProfileStore::load),
/// which falls back to an empty profile, but [`ProfileStore::read`] surfaces
/// them for callers that want to know.
///
/// [`ProfileStore::read`]: crate::ProfileStore::read
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Failed to read or create the profile file.
    #[error("failed to access profile file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The profile is not valid JSON or does not match the expected layout.
    #[error("failed to parse profile JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
