//! Plasma Audio Core - real-time audio management
//!
//! Decides which of many registered 3D sounds may occupy the limited
//! hardware voices, blends the reverb of overlapping environment regions
//! and drives the audio device through its lifecycle.
//!
//! # Architecture
//!
//! - [`SoundRegistry`] - Intrusive two-list registry of soft-volume sounds
//! - [`RankedSelector`] - Per-pass ranking, admission and eviction
//! - [`ReverbBlender`] - Region reverb blending with change cache and morph throttle
//! - [`AudioSystem`] - Device lifecycle, mute and fade, and the per-frame tick
//! - [`AudioBackend`] - Seam to the device layer

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fade;
#[cfg(test)]
mod integration;
pub mod message;
pub mod registry;
pub mod reverb;
pub mod selector;
pub mod sound;
pub mod system;
#[cfg(test)]
pub(crate) mod test_utils;

pub use backend::{AudioBackend, DEFAULT_DEVICE, DeviceCaps, DistanceModel, NullBackend, friendly_device_name};
pub use config::AudioSettings;
pub use diagnostics::{ActiveSoundReport, ActiveSoundRow, DebugStat};
pub use error::{BackendError, ConfigError};
pub use fade::GlobalFade;
pub use message::{AudioEvent, AudioNotice, ReceiverId};
pub use registry::{NodeId, SoftList, SoundRegistry};
pub use reverb::{
    OcclusionSoftValues, RegionKey, RegionLookup, ReverbBlender, ReverbCache, ReverbDecision, ReverbPreset,
    ReverbProperties, ReverbRegion, SourceParams, SourceReverbSettings,
};
pub use selector::{Activation, RankedSelector, SelectorContext, SoftDecision, SoftPass};
pub use sound::{AudioChannel, SoftSound, SoundKey, SoundLookup, StreamType};
pub use system::{AudioSystem, LifecycleState};
