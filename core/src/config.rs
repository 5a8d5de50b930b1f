//! Audio settings (`audio.toml`)
//!
//! Loads, saves and provides defaults for the audio system's persisted
//! settings. Stored as TOML in the platform-specific config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::DistanceModel;
use crate::error::ConfigError;
use crate::sound::AudioChannel;

/// File name inside [`config_dir`]
pub const SETTINGS_FILE: &str = "audio.toml";

/// Persisted audio settings.
///
/// Every field has a default so partial files load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Master switch. When false, activation is refused (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preferred output device; empty selects the default device
    #[serde(default)]
    pub device: String,
    /// Start muted (default: false)
    #[serde(default)]
    pub muted: bool,
    /// Use environmental reverb if the device supports it (default: true)
    #[serde(default = "default_true")]
    pub reverb_enabled: bool,
    /// Sounds with a priority above this never play (default: 9)
    #[serde(default = "default_priority_cutoff")]
    pub priority_cutoff: u8,
    /// Length of the fade-in after activation, in seconds (default: 3.0)
    #[serde(default = "default_fade_length")]
    pub fade_length_secs: f32,
    /// Minimum interval between soft-volume passes (default: 100)
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Per-channel volume, indexed by [`AudioChannel::index`] (default: 1.0)
    #[serde(default = "default_channel_volumes")]
    pub channel_volumes: [f32; AudioChannel::COUNT],
    /// Distance attenuation model (default: inverse clamped)
    #[serde(default)]
    pub distance_model: DistanceModel,
    /// Forward listener velocity to the device (default: false)
    #[serde(default)]
    pub doppler: bool,
    /// Log every soft-volume pass at debug level (default: false)
    #[serde(default)]
    pub extended_logs: bool,
}

fn default_true() -> bool {
    true
}
fn default_priority_cutoff() -> u8 {
    9
}
fn default_fade_length() -> f32 {
    3.0
}
fn default_update_interval() -> u64 {
    100
}
fn default_channel_volumes() -> [f32; AudioChannel::COUNT] {
    [1.0; AudioChannel::COUNT]
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            device: String::new(),
            muted: false,
            reverb_enabled: default_true(),
            priority_cutoff: default_priority_cutoff(),
            fade_length_secs: default_fade_length(),
            update_interval_ms: default_update_interval(),
            channel_volumes: default_channel_volumes(),
            distance_model: DistanceModel::default(),
            doppler: false,
            extended_logs: false,
        }
    }
}

impl AudioSettings {
    pub fn channel_volume(&self, channel: AudioChannel) -> f32 {
        self.channel_volumes[channel.index()]
    }

    /// Fade length as a duration. Negative lengths clamp to zero; lengths
    /// too large to represent fall back to the default.
    pub fn fade_length(&self) -> Duration {
        Duration::try_from_secs_f32(self.fade_length_secs.max(0.0)).unwrap_or_else(|_| {
            tracing::warn!("Invalid fade length {}, using default", self.fade_length_secs);
            Duration::from_secs_f32(default_fade_length())
        })
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Plasma\config`
/// On macOS: `~/Library/Application Support/org.plasma.Plasma`
/// On Linux: `~/.config/plasma`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "plasma", "Plasma").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the settings from the platform config directory.
///
/// Falls back to defaults if the file is missing or invalid.
pub fn load() -> AudioSettings {
    let Some(path) = config_dir().map(|dir| dir.join(SETTINGS_FILE)) else {
        return AudioSettings::default();
    };
    if !path.exists() {
        return AudioSettings::default();
    }
    match load_from_path(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Ignoring audio settings: {}", e);
            AudioSettings::default()
        }
    }
}

/// Loads settings from an explicit path.
pub fn load_from_path(path: &Path) -> Result<AudioSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AudioSettings, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Saves settings to the platform config directory, creating it if needed.
pub fn save(settings: &AudioSettings) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to_path(settings, &dir.join(SETTINGS_FILE)),
        None => Ok(()),
    }
}

pub fn save_to_path(settings: &AudioSettings, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(io_err)
}
