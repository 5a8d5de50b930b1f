//! Error types for the audio core

use std::path::PathBuf;

/// Failures reported by an audio backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The named device could not be opened
    #[error("failed to open audio device '{0}'")]
    DeviceOpen(String),

    /// The device has no environmental reverb support
    #[error("reverb is not supported by this device")]
    ReverbUnsupported,

    /// The backend rejected a parameter write
    #[error("backend rejected {what}: {reason}")]
    Rejected { what: &'static str, reason: String },
}

/// Failures while reading or writing `audio.toml`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid audio settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize audio settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
