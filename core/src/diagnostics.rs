//! Runtime statistics for debug overlays and logs
//!
//! The selector fills an [`ActiveSoundReport`] every pass; the controller
//! exposes a flat list of [`DebugStat`]s summarizing its own state.

use std::fmt;

use crate::sound::{AudioChannel, SoundKey, StreamType};

/// A single named statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStat {
    pub name: String,
    /// Current value as a formatted string
    pub value: String,
}

impl DebugStat {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a stat from any displayable value.
    pub fn number(name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// Create a stat for a `[0, 1]` fraction, formatted as a percentage.
    pub fn percent(name: impl Into<String>, fraction: f32) -> Self {
        Self {
            name: name.into(),
            value: format!("{:.0}%", fraction * 100.0),
        }
    }
}

impl fmt::Display for DebugStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// One ranked sound as seen by the last pass
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSoundRow {
    pub key: SoundKey,
    pub priority: u8,
    /// Composite rank the sound was sorted by
    pub rank: f32,
    /// `volume_rank / volume`, 0 for a silent sound
    pub soft_volume: f32,
    pub stream_type: StreamType,
    pub channel: AudioChannel,
    pub incidental: bool,
    /// False for sounds that lost the ranking this pass
    pub enabled: bool,
    pub name: String,
    /// Current occlusion in millibels for sounds with reverb send settings
    pub occlusion: Option<i16>,
}

impl fmt::Display for ActiveSoundRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            self.key.to_string()
        } else {
            self.name.clone()
        };
        if self.enabled {
            write!(f, "{} {:.2} {:.2} {}", self.priority, self.rank, self.soft_volume, name)?;
        } else {
            write!(f, "{} {:.2} {} (stopped)", self.priority, self.soft_volume, name)?;
        }
        if let Some(occlusion) = self.occlusion {
            write!(f, " occ {}", occlusion)?;
        }
        Ok(())
    }
}

/// Ranked sounds of the last pass, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSoundReport {
    pub rows: Vec<ActiveSoundRow>,
}

impl ActiveSoundReport {
    pub fn enabled(&self) -> impl Iterator<Item = &ActiveSoundRow> {
        self.rows.iter().filter(|r| r.enabled)
    }

    /// Emit the report at trace level
    pub fn log(&self) {
        for row in &self.rows {
            tracing::trace!(target: "plasma_audio::active_sounds", "{}", row);
        }
    }
}
