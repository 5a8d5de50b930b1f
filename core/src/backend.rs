//! Audio device backend interface
//!
//! The concrete OpenAL/EFX binding lives outside this crate. The controller
//! talks to it through [`AudioBackend`]; [`NullBackend`] stands in when no
//! device is wanted.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::reverb::{ReverbProperties, SourceParams, SourceReverbSettings};
use crate::sound::SoundKey;

/// Device name meaning "whatever the platform picks"
pub const DEFAULT_DEVICE: &str = "(Default Device)";

/// Names the OpenAL implementations give their default device
const DEFAULT_DEVICE_NAMES: [&str; 3] = ["Generic Software", "Generic Hardware", "OpenAL Soft"];

/// Prefixes the OpenAL implementations prepend to real device names
const DEVICE_PREFIXES: [&str; 3] = ["Generic Software on ", "Generic Hardware on ", "OpenAL Soft on "];

/// Strip implementation prefixes from a device name for display.
///
/// The implementations' own default devices map to [`DEFAULT_DEVICE`].
pub fn friendly_device_name(device: &str) -> &str {
    if DEFAULT_DEVICE_NAMES.contains(&device) {
        return DEFAULT_DEVICE;
    }
    DEVICE_PREFIXES
        .iter()
        .find_map(|prefix| device.strip_prefix(prefix))
        .unwrap_or(device)
}

/// True for the empty name and the magic default name
pub fn is_default_device(device: &str) -> bool {
    device.is_empty() || device == DEFAULT_DEVICE
}

/// Capabilities reported by an opened device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCaps {
    /// Number of simultaneous voices the device could allocate; 0 if unknown
    pub voice_limit: u32,
}

/// Distance attenuation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    None,
    Inverse,
    #[default]
    InverseClamped,
    Linear,
    LinearClamped,
    Exponent,
    ExponentClamped,
}

/// Device-facing operations the audio system needs.
///
/// Listener and gain setters default to no-ops so minimal backends only
/// implement what they support.
pub trait AudioBackend {
    /// Open a device. `None` requests the platform default.
    fn open(&mut self, device: Option<&str>) -> Result<DeviceCaps, BackendError>;

    fn close(&mut self);

    fn set_listener_position(&mut self, _position: Vec3) {}

    fn set_listener_velocity(&mut self, _velocity: Vec3) {}

    fn set_listener_orientation(&mut self, _forward: Vec3, _up: Vec3) {}

    fn set_distance_model(&mut self, _model: DistanceModel) {}

    /// Listener gain, already scaled by the global fade
    fn set_global_gain(&mut self, _gain: f32) {}

    /// Prepare the environmental reverb slot
    fn init_reverb(&mut self) -> Result<(), BackendError> {
        Err(BackendError::ReverbUnsupported)
    }

    fn shutdown_reverb(&mut self) {}

    fn set_reverb_properties(&mut self, _props: &ReverbProperties) -> Result<(), BackendError> {
        Err(BackendError::ReverbUnsupported)
    }

    /// Write the `params` groups of a source's reverb send settings
    fn set_source_reverb(
        &mut self,
        _source: SoundKey,
        _settings: &SourceReverbSettings,
        _params: SourceParams,
    ) -> Result<(), BackendError> {
        Err(BackendError::ReverbUnsupported)
    }
}

/// Backend without a device. Opening always succeeds with no voice limit
/// and reverb is unsupported.
#[derive(Debug, Default)]
pub struct NullBackend {
    open: bool,
}

impl NullBackend {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl AudioBackend for NullBackend {
    fn open(&mut self, _device: Option<&str>) -> Result<DeviceCaps, BackendError> {
        self.open = true;
        Ok(DeviceCaps::default())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
