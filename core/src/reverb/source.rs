//! Per-source reverb send settings
//!
//! Each sound can carry its own room levels, rolloff factors and an
//! occlusion block. Occlusion is authored as two endpoint blocks and a soft
//! value in `[0, 1]` picks the point between them. Changed parameter groups
//! are tracked so the backend only rewrites what moved.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Parameter groups of a [`SourceReverbSettings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceParams(u8);

impl SourceParams {
    pub const NONE: Self = Self(0);
    pub const ROOM: Self = Self(0x01);
    pub const OUTSIDE_VOL_HF: Self = Self(0x02);
    pub const FACTORS: Self = Self(0x04);
    pub const OCCLUSION: Self = Self(0x08);
    pub const ALL: Self = Self(0x0f);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SourceParams {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SourceParams {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Occlusion block, in EAX units (occlusion in millibels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionSoftValues {
    pub occlusion: i16,
    pub lf_ratio: f32,
    pub room_ratio: f32,
    pub direct_ratio: f32,
}

impl Default for OcclusionSoftValues {
    fn default() -> Self {
        Self {
            occlusion: 0,
            lf_ratio: 0.25,
            room_ratio: 1.5,
            direct_ratio: 1.0,
        }
    }
}

impl OcclusionSoftValues {
    /// Linear blend toward `end`; occlusion truncates toward zero
    pub fn interpolate(&self, end: &Self, percent: f32) -> Self {
        let inv = 1.0 - percent;
        Self {
            occlusion: (f32::from(self.occlusion) * inv + f32::from(end.occlusion) * percent) as i16,
            lf_ratio: self.lf_ratio * inv + end.lf_ratio * percent,
            room_ratio: self.room_ratio * inv + end.room_ratio * percent,
            direct_ratio: self.direct_ratio * inv + end.direct_ratio * percent,
        }
    }
}

/// Reverb send settings for one sound source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReverbSettings {
    enabled: bool,
    room: i16,
    room_hf: i16,
    room_auto: bool,
    room_hf_auto: bool,
    outside_vol_hf: i16,
    air_absorption_factor: f32,
    room_rolloff_factor: f32,
    doppler_factor: f32,
    rolloff_factor: f32,
    soft_starts: OcclusionSoftValues,
    soft_ends: OcclusionSoftValues,
    current_softs: OcclusionSoftValues,
    occlusion_soft_value: f32,
    dirty: SourceParams,
}

impl Default for SourceReverbSettings {
    fn default() -> Self {
        let mut settings = Self {
            enabled: false,
            room: 0,
            room_hf: 0,
            room_auto: true,
            room_hf_auto: true,
            outside_vol_hf: 0,
            air_absorption_factor: 1.0,
            room_rolloff_factor: 0.0,
            doppler_factor: 0.0,
            rolloff_factor: 0.0,
            soft_starts: OcclusionSoftValues::default(),
            soft_ends: OcclusionSoftValues::default(),
            current_softs: OcclusionSoftValues::default(),
            occlusion_soft_value: 0.0,
            dirty: SourceParams::NONE,
        };
        settings.enable(false);
        settings
    }
}

impl SourceReverbSettings {
    /// Disabling resets every parameter to its neutral value
    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.room = 0;
            self.room_hf = 0;
            self.room_auto = true;
            self.room_hf_auto = true;
            self.outside_vol_hf = 0;
            self.air_absorption_factor = 1.0;
            self.room_rolloff_factor = 0.0;
            self.doppler_factor = 0.0;
            self.rolloff_factor = 0.0;
            self.occlusion_soft_value = 0.0;
            self.soft_starts = OcclusionSoftValues::default();
            self.soft_ends = OcclusionSoftValues::default();
            self.current_softs = OcclusionSoftValues::default();
            self.dirty = SourceParams::ALL;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Room levels in millibels. `auto` lets the device derive the send
    /// level from distance.
    pub fn set_room_params(&mut self, room: i16, room_hf: i16, room_auto: bool, room_hf_auto: bool) {
        self.room = room;
        self.room_hf = room_hf;
        self.room_auto = room_auto;
        self.room_hf_auto = room_hf_auto;
        self.dirty |= SourceParams::ROOM;
    }

    pub fn set_outside_vol_hf(&mut self, volume: i16) {
        self.outside_vol_hf = volume;
        self.dirty |= SourceParams::OUTSIDE_VOL_HF;
    }

    pub fn set_factors(&mut self, air_absorption: f32, room_rolloff: f32, doppler: f32, rolloff: f32) {
        self.air_absorption_factor = air_absorption;
        self.room_rolloff_factor = room_rolloff;
        self.doppler_factor = doppler;
        self.rolloff_factor = rolloff;
        self.dirty |= SourceParams::FACTORS;
    }

    /// Replace both occlusion endpoints and re-derive the current block
    pub fn set_occlusion_range(&mut self, starts: OcclusionSoftValues, ends: OcclusionSoftValues) {
        self.soft_starts = starts;
        self.soft_ends = ends;
        self.recalc_softs();
    }

    /// Move between the occlusion endpoints. Unchanged values do nothing.
    pub fn set_occlusion_soft_value(&mut self, value: f32) {
        if self.occlusion_soft_value != value {
            self.occlusion_soft_value = value;
            self.recalc_softs();
        }
    }

    fn recalc_softs(&mut self) {
        self.current_softs = self
            .soft_starts
            .interpolate(&self.soft_ends, self.occlusion_soft_value);
        self.dirty |= SourceParams::OCCLUSION;
    }

    pub fn room(&self) -> i16 {
        self.room
    }

    pub fn room_hf(&self) -> i16 {
        self.room_hf
    }

    pub fn room_auto(&self) -> bool {
        self.room_auto
    }

    pub fn room_hf_auto(&self) -> bool {
        self.room_hf_auto
    }

    /// Room level as a linear gain
    pub fn room_gain(&self) -> f32 {
        10f32.powf(f32::from(self.room) / 2000.0)
    }

    pub fn outside_vol_hf(&self) -> i16 {
        self.outside_vol_hf
    }

    pub fn air_absorption_factor(&self) -> f32 {
        self.air_absorption_factor
    }

    pub fn room_rolloff_factor(&self) -> f32 {
        self.room_rolloff_factor
    }

    pub fn doppler_factor(&self) -> f32 {
        self.doppler_factor
    }

    pub fn rolloff_factor(&self) -> f32 {
        self.rolloff_factor
    }

    pub fn occlusion_soft_value(&self) -> f32 {
        self.occlusion_soft_value
    }

    pub fn current_softs(&self) -> &OcclusionSoftValues {
        &self.current_softs
    }

    /// Groups changed since the last [`clear_dirty`](Self::clear_dirty)
    pub fn dirty(&self) -> SourceParams {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = SourceParams::NONE;
    }
}
