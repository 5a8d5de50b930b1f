//! EFX EAX-reverb parameter block, presets and interpolation

use serde::{Deserialize, Serialize};

/// Minimum for the room-level gains (`gain`, `gain_hf`, `gain_lf`)
pub const REVERB_MIN_GAIN: f32 = 0.0;

/// Upper bound on `reflections_delay`, seconds
pub const MAX_REFLECTIONS_DELAY: f32 = 0.3;

/// Upper bound on `late_reverb_delay`, seconds
pub const MAX_LATE_REVERB_DELAY: f32 = 0.1;

/// One EAX reverb parameter block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbProperties {
    pub density: f32,
    pub diffusion: f32,
    pub gain: f32,
    pub gain_hf: f32,
    pub gain_lf: f32,
    pub decay_time: f32,
    pub decay_hf_ratio: f32,
    pub decay_lf_ratio: f32,
    pub reflections_gain: f32,
    pub reflections_delay: f32,
    pub reflections_pan: [f32; 3],
    pub late_reverb_gain: f32,
    pub late_reverb_delay: f32,
    pub late_reverb_pan: [f32; 3],
    pub echo_time: f32,
    pub echo_depth: f32,
    pub modulation_time: f32,
    pub modulation_depth: f32,
    pub air_absorption_gain_hf: f32,
    pub hf_reference: f32,
    pub lf_reference: f32,
    pub room_rolloff_factor: f32,
    pub decay_hf_limit: bool,
}

impl ReverbProperties {
    pub const GENERIC: Self = Self {
        density: 1.0,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.8913,
        gain_lf: 1.0,
        decay_time: 1.49,
        decay_hf_ratio: 0.83,
        decay_lf_ratio: 1.0,
        reflections_gain: 0.05,
        reflections_delay: 0.007,
        reflections_pan: [0.0; 3],
        late_reverb_gain: 1.2589,
        late_reverb_delay: 0.011,
        late_reverb_pan: [0.0; 3],
        echo_time: 0.25,
        echo_depth: 0.0,
        modulation_time: 0.25,
        modulation_depth: 0.0,
        air_absorption_gain_hf: 0.9943,
        hf_reference: 5000.0,
        lf_reference: 250.0,
        room_rolloff_factor: 0.0,
        decay_hf_limit: true,
    };

    pub const ROOM: Self = Self {
        density: 0.4287,
        gain_hf: 0.5929,
        decay_time: 0.4,
        reflections_gain: 0.1503,
        reflections_delay: 0.002,
        late_reverb_gain: 1.0629,
        late_reverb_delay: 0.003,
        ..Self::GENERIC
    };

    pub const HALLWAY: Self = Self {
        density: 0.3645,
        gain_hf: 0.7079,
        decay_hf_ratio: 0.59,
        reflections_gain: 0.2458,
        late_reverb_gain: 1.6615,
        ..Self::GENERIC
    };

    pub const CAVE: Self = Self {
        gain_hf: 1.0,
        decay_time: 2.91,
        decay_hf_ratio: 1.3,
        reflections_gain: 0.5,
        reflections_delay: 0.015,
        late_reverb_gain: 0.7063,
        late_reverb_delay: 0.022,
        decay_hf_limit: false,
        ..Self::GENERIC
    };

    pub const UNDERWATER: Self = Self {
        density: 0.3645,
        gain_hf: 0.01,
        decay_hf_ratio: 0.1,
        reflections_gain: 0.5963,
        late_reverb_gain: 7.0795,
        modulation_time: 1.18,
        modulation_depth: 0.348,
        ..Self::GENERIC
    };

    /// Block written when no region is audible: generic with the room gain
    /// at its minimum
    pub fn quiet() -> Self {
        Self {
            gain: REVERB_MIN_GAIN,
            ..Self::GENERIC
        }
    }

    /// Blend toward `finish` by `ratio`.
    ///
    /// Gains and depths blend linearly; times, ratios and reference
    /// frequencies blend in the log domain. Delays are clamped to their
    /// device maxima.
    pub fn interpolate(&self, finish: &Self, ratio: f32) -> Self {
        if ratio >= 1.0 {
            return *finish;
        }
        if ratio <= 0.0 {
            return *self;
        }
        let lin = |a: f32, b: f32| lerp(a, b, ratio);
        let log = |a: f32, b: f32| log_lerp(a, b, ratio);
        let pan = |a: [f32; 3], b: [f32; 3]| [lin(a[0], b[0]), lin(a[1], b[1]), lin(a[2], b[2])];

        Self {
            density: lin(self.density, finish.density),
            diffusion: lin(self.diffusion, finish.diffusion),
            gain: lin(self.gain, finish.gain),
            gain_hf: lin(self.gain_hf, finish.gain_hf),
            gain_lf: lin(self.gain_lf, finish.gain_lf),
            decay_time: log(self.decay_time, finish.decay_time),
            decay_hf_ratio: log(self.decay_hf_ratio, finish.decay_hf_ratio),
            decay_lf_ratio: log(self.decay_lf_ratio, finish.decay_lf_ratio),
            reflections_gain: lin(self.reflections_gain, finish.reflections_gain),
            reflections_delay: log(self.reflections_delay, finish.reflections_delay)
                .min(MAX_REFLECTIONS_DELAY),
            reflections_pan: pan(self.reflections_pan, finish.reflections_pan),
            late_reverb_gain: lin(self.late_reverb_gain, finish.late_reverb_gain),
            late_reverb_delay: log(self.late_reverb_delay, finish.late_reverb_delay)
                .min(MAX_LATE_REVERB_DELAY),
            late_reverb_pan: pan(self.late_reverb_pan, finish.late_reverb_pan),
            echo_time: log(self.echo_time, finish.echo_time),
            echo_depth: lin(self.echo_depth, finish.echo_depth),
            modulation_time: log(self.modulation_time, finish.modulation_time),
            modulation_depth: lin(self.modulation_depth, finish.modulation_depth),
            air_absorption_gain_hf: lin(self.air_absorption_gain_hf, finish.air_absorption_gain_hf),
            hf_reference: log(self.hf_reference, finish.hf_reference),
            lf_reference: log(self.lf_reference, finish.lf_reference),
            room_rolloff_factor: lin(self.room_rolloff_factor, finish.room_rolloff_factor),
            decay_hf_limit: if ratio < 0.5 {
                self.decay_hf_limit
            } else {
                finish.decay_hf_limit
            },
        }
    }

    /// Scale the room-level gains toward [`REVERB_MIN_GAIN`]; `strength` 1
    /// leaves them untouched, 0 drives them to the minimum.
    pub fn mute(&mut self, strength: f32) {
        let s = strength.clamp(0.0, 1.0);
        for g in [&mut self.gain, &mut self.gain_hf, &mut self.gain_lf] {
            *g = lerp(REVERB_MIN_GAIN, *g, s);
        }
    }
}

impl Default for ReverbProperties {
    fn default() -> Self {
        Self::GENERIC
    }
}

/// Named environments a region can be authored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbPreset {
    #[default]
    Generic,
    Room,
    Hallway,
    Cave,
    Underwater,
}

impl ReverbPreset {
    pub fn properties(self) -> ReverbProperties {
        match self {
            Self::Generic => ReverbProperties::GENERIC,
            Self::Room => ReverbProperties::ROOM,
            Self::Hallway => ReverbProperties::HALLWAY,
            Self::Cave => ReverbProperties::CAVE,
            Self::Underwater => ReverbProperties::UNDERWATER,
        }
    }
}

fn lerp(start: f32, finish: f32, ratio: f32) -> f32 {
    start * (1.0 - ratio) + finish * ratio
}

fn log_lerp(start: f32, finish: f32, ratio: f32) -> f32 {
    if start <= 0.0 || finish <= 0.0 {
        return lerp(start, finish, ratio);
    }
    lerp(start.ln(), finish.ln(), ratio).exp()
}
