//! Shared test doubles for the audio core

use glam::Vec3;

use crate::backend::{AudioBackend, DeviceCaps, DistanceModel};
use crate::error::BackendError;
use crate::reverb::{ReverbProperties, ReverbRegion, SourceParams, SourceReverbSettings};
use crate::sound::{AudioChannel, SoftSound, SoundKey, StreamType};

// ============================================================================
// Sounds
// ============================================================================

/// Scripted sound that records every call the engine makes on it
#[derive(Debug, Clone)]
pub struct MockSound {
    pub priority: u8,
    pub volume: f32,
    /// Soft volume produced by `calc_soft_volume(true, _)`
    pub soft_volume: f32,
    /// Squared listener distance when in range
    pub in_range: Option<f32>,
    pub playing: bool,
    pub muted: Option<bool>,
    pub channel: AudioChannel,
    pub name: String,
    rank: f32,
    pub update_count: u32,
    pub disable_count: u32,
    pub force_unregistered: bool,
    /// Every `update_soft_volume(enable, force_hard_stop)` call in order
    pub soft_calls: Vec<(bool, bool)>,
    pub source_reverb: Option<SourceReverbSettings>,
}

impl MockSound {
    pub fn new(priority: u8, soft_volume: f32) -> Self {
        Self {
            priority,
            volume: 1.0,
            soft_volume,
            in_range: Some(1.0),
            playing: false,
            muted: None,
            channel: AudioChannel::SoundFx,
            name: String::new(),
            rank: 0.0,
            update_count: 0,
            disable_count: 0,
            force_unregistered: false,
            soft_calls: Vec::new(),
            source_reverb: None,
        }
    }

    pub fn out_of_range(priority: u8) -> Self {
        Self {
            in_range: None,
            ..Self::new(priority, 1.0)
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn last_soft_call(&self) -> Option<(bool, bool)> {
        self.soft_calls.last().copied()
    }
}

impl SoftSound for MockSound {
    fn update(&mut self) {
        self.update_count += 1;
    }

    fn is_within_range(&self, _listener: Vec3) -> Option<f32> {
        self.in_range
    }

    fn calc_soft_volume(&mut self, enable: bool, _dist_squared: f32) {
        self.rank = if enable { self.soft_volume * self.volume } else { 0.0 };
    }

    fn volume_rank(&self) -> f32 {
        self.rank
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn update_soft_volume(&mut self, enable: bool, force_hard_stop: bool) {
        self.soft_calls.push((enable, force_hard_stop));
        self.playing = enable;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = Some(muted);
    }

    fn disable(&mut self) {
        self.disable_count += 1;
    }

    fn force_unregister(&mut self) {
        self.force_unregistered = true;
    }

    fn stream_type(&self) -> StreamType {
        StreamType::FromRam
    }

    fn channel(&self) -> AudioChannel {
        self.channel
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn source_reverb(&self) -> Option<&SourceReverbSettings> {
        self.source_reverb.as_ref()
    }
}

// ============================================================================
// Reverb regions
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockRegion {
    pub strength: f32,
    pub properties: ReverbProperties,
}

impl MockRegion {
    pub fn new(strength: f32, properties: ReverbProperties) -> Self {
        Self { strength, properties }
    }
}

impl ReverbRegion for MockRegion {
    fn strength(&self) -> f32 {
        self.strength
    }

    fn properties(&self) -> &ReverbProperties {
        &self.properties
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Backend that records calls and fails on demand
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub voice_limit: u32,
    /// Named devices that refuse to open
    pub broken_devices: Vec<String>,
    pub default_broken: bool,
    pub reverb_supported: bool,
    pub reverb_write_fails: bool,

    pub open_requests: Vec<Option<String>>,
    pub is_open: bool,
    pub close_count: u32,
    pub reverb_initialized: bool,
    pub reverb_shutdowns: u32,
    pub reverb_writes: Vec<ReverbProperties>,
    pub source_writes: Vec<(SoundKey, SourceParams)>,
    pub gains: Vec<f32>,
    pub listener_positions: Vec<Vec3>,
    pub listener_velocities: Vec<Vec3>,
    pub orientations: Vec<(Vec3, Vec3)>,
    pub distance_model: Option<DistanceModel>,
}

impl RecordingBackend {
    pub fn new(voice_limit: u32) -> Self {
        Self {
            voice_limit,
            reverb_supported: true,
            ..Self::default()
        }
    }

    pub fn last_gain(&self) -> Option<f32> {
        self.gains.last().copied()
    }
}

impl AudioBackend for RecordingBackend {
    fn open(&mut self, device: Option<&str>) -> Result<DeviceCaps, BackendError> {
        self.open_requests.push(device.map(str::to_string));
        let broken = match device {
            Some(name) => self.broken_devices.iter().any(|d| d == name),
            None => self.default_broken,
        };
        if broken {
            return Err(BackendError::DeviceOpen(device.unwrap_or("default").to_string()));
        }
        self.is_open = true;
        Ok(DeviceCaps {
            voice_limit: self.voice_limit,
        })
    }

    fn close(&mut self) {
        self.is_open = false;
        self.close_count += 1;
    }

    fn set_listener_position(&mut self, position: Vec3) {
        self.listener_positions.push(position);
    }

    fn set_listener_velocity(&mut self, velocity: Vec3) {
        self.listener_velocities.push(velocity);
    }

    fn set_listener_orientation(&mut self, forward: Vec3, up: Vec3) {
        self.orientations.push((forward, up));
    }

    fn set_distance_model(&mut self, model: DistanceModel) {
        self.distance_model = Some(model);
    }

    fn set_global_gain(&mut self, gain: f32) {
        self.gains.push(gain);
    }

    fn init_reverb(&mut self) -> Result<(), BackendError> {
        if !self.reverb_supported {
            return Err(BackendError::ReverbUnsupported);
        }
        self.reverb_initialized = true;
        Ok(())
    }

    fn shutdown_reverb(&mut self) {
        self.reverb_initialized = false;
        self.reverb_shutdowns += 1;
    }

    fn set_reverb_properties(&mut self, props: &ReverbProperties) -> Result<(), BackendError> {
        if self.reverb_write_fails {
            return Err(BackendError::Rejected {
                what: "reverb properties",
                reason: "scripted failure".to_string(),
            });
        }
        self.reverb_writes.push(*props);
        Ok(())
    }

    fn set_source_reverb(
        &mut self,
        source: SoundKey,
        _settings: &SourceReverbSettings,
        params: SourceParams,
    ) -> Result<(), BackendError> {
        if self.reverb_write_fails {
            return Err(BackendError::Rejected {
                what: "source reverb",
                reason: "scripted failure".to_string(),
            });
        }
        self.source_writes.push((source, params));
        Ok(())
    }
}
