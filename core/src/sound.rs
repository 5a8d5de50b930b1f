//! Sound entity interface consumed by the soft-volume engine
//!
//! Sounds are owned by the scene. The audio core only stores [`SoundKey`]s
//! and resolves them through a [`SoundLookup`] each pass, so a sound that
//! was unloaded between passes simply stops contributing.

use glam::Vec3;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::reverb::SourceReverbSettings;

/// Handle to a sound entity owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundKey(pub u32);

impl std::fmt::Display for SoundKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sound#{}", self.0)
    }
}

/// How a sound's sample data reaches the device (diagnostics only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// Fully decoded into a static buffer
    #[default]
    NoStream,
    /// Streamed from disk
    FromDisk,
    /// Streamed from an in-memory copy
    FromRam,
    /// Decoded on the fly from a compressed stream
    Compressed,
}

/// Mixer channel a sound belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannel {
    #[default]
    SoundFx,
    BackgroundMusic,
    Ambience,
    Voice,
    Gui,
    NpcVoice,
}

impl AudioChannel {
    /// Number of mixer channels
    pub const COUNT: usize = 6;

    /// All channels in table order
    pub const ALL: [AudioChannel; Self::COUNT] = [
        AudioChannel::SoundFx,
        AudioChannel::BackgroundMusic,
        AudioChannel::Ambience,
        AudioChannel::Voice,
        AudioChannel::Gui,
        AudioChannel::NpcVoice,
    ];

    /// Index into the channel volume table
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A scene sound that participates in soft-volume ranking.
///
/// Priority is a small integer where lower values are more important.
/// The ranked selector converts it to `(10 - priority) * volume_rank`.
pub trait SoftSound {
    /// Per-frame housekeeping (fades, streaming refills)
    fn update(&mut self);

    /// Returns the squared listener distance if `listener` is inside the
    /// sound's attenuation range, `None` otherwise.
    fn is_within_range(&self, listener: Vec3) -> Option<f32>;

    /// Recompute the soft-volume attenuation for a tentative enable state
    fn calc_soft_volume(&mut self, enable: bool, dist_squared: f32);

    /// Soft volume scaled by the sound's volume, as computed by the last
    /// [`calc_soft_volume`](Self::calc_soft_volume) call
    fn volume_rank(&self) -> f32;

    /// Current authored volume
    fn volume(&self) -> f32;

    fn priority(&self) -> u8;

    fn is_playing(&self) -> bool;

    /// Tell the sound whether it won a voice this pass.
    ///
    /// With `force_hard_stop` set the sound must drop any fade or ramp
    /// state and go silent immediately, as on its very first update.
    fn update_soft_volume(&mut self, enable: bool, force_hard_stop: bool);

    fn set_muted(&mut self, muted: bool);

    /// Force the distance attenuation to zero
    fn disable(&mut self);

    /// Called when the audio system shuts down with the sound still registered
    fn force_unregister(&mut self);

    fn stream_type(&self) -> StreamType {
        StreamType::NoStream
    }

    fn channel(&self) -> AudioChannel {
        AudioChannel::SoundFx
    }

    fn is_incidental(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        ""
    }

    /// Per-source reverb send settings, if the sound has any
    fn source_reverb(&self) -> Option<&SourceReverbSettings> {
        None
    }
}

/// Resolves sound keys to live scene sounds
pub trait SoundLookup {
    /// Returns `None` if the sound is not loaded
    fn sound_mut(&mut self, key: SoundKey) -> Option<&mut dyn SoftSound>;
}

impl<S: SoftSound> SoundLookup for HashMap<SoundKey, S> {
    fn sound_mut(&mut self, key: SoundKey) -> Option<&mut dyn SoftSound> {
        self.get_mut(&key).map(|s| s as &mut dyn SoftSound)
    }
}
