//! Scene files and the simulated sounds and regions they describe

use std::path::Path;

use anyhow::{Context, Result, ensure};
use glam::Vec3;
use plasma_audio_core::{AudioChannel, ReverbPreset, ReverbProperties, ReverbRegion, SoftSound, SoundKey};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub sounds: Vec<SoundDef>,
    #[serde(default)]
    pub regions: Vec<RegionDef>,
    pub listener: ListenerPath,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoundDef {
    pub key: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    pub position: Vec3,
    /// Full volume inside this distance
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    /// Inaudible past this distance
    pub max_distance: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub channel: AudioChannel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionDef {
    pub key: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preset: ReverbPreset,
    pub center: Vec3,
    /// Full strength inside this radius
    pub inner_radius: f32,
    /// Strength falls to zero at this radius
    pub outer_radius: f32,
}

/// Piecewise-linear listener route, walked at constant speed per segment
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerPath {
    pub waypoints: Vec<Vec3>,
}

fn default_priority() -> u8 {
    5
}

fn default_min_distance() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

impl ListenerPath {
    /// Position at `t` in `[0, 1]` along the route
    pub fn position_at(&self, t: f32) -> Vec3 {
        match self.waypoints.as_slice() {
            [] => Vec3::ZERO,
            [only] => *only,
            points => {
                let segments = (points.len() - 1) as f32;
                let scaled = t.clamp(0.0, 1.0) * segments;
                let index = (scaled as usize).min(points.len() - 2);
                let local = scaled - index as f32;
                points[index].lerp(points[index + 1], local)
            }
        }
    }
}

pub fn parse(content: &str) -> Result<Scene> {
    let scene: Scene = toml::from_str(content)?;
    for sound in &scene.sounds {
        ensure!(
            sound.max_distance >= sound.min_distance && sound.min_distance > 0.0,
            "sound {} has an invalid distance range",
            sound.key
        );
    }
    for region in &scene.regions {
        ensure!(
            region.outer_radius > region.inner_radius,
            "region {} outer radius must exceed its inner radius",
            region.key
        );
    }
    Ok(scene)
}

pub fn load(path: &Path) -> Result<Scene> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read scene {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid scene {}", path.display()))
}

// ============================================================================
// Simulated sounds
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimSound {
    pub def: SoundDef,
    soft_volume: f32,
    playing: bool,
    muted: bool,
    pub registered: bool,
    pub hard_stops: u32,
}

impl SimSound {
    pub fn new(def: SoundDef) -> Self {
        Self {
            def,
            soft_volume: 0.0,
            playing: false,
            muted: false,
            registered: true,
            hard_stops: 0,
        }
    }

    pub fn key(&self) -> SoundKey {
        SoundKey(self.def.key)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Inverse-clamped distance attenuation
    fn attenuation(&self, dist_squared: f32) -> f32 {
        let distance = dist_squared.sqrt().max(self.def.min_distance);
        self.def.min_distance / distance
    }
}

impl SoftSound for SimSound {
    fn update(&mut self) {}

    fn is_within_range(&self, listener: Vec3) -> Option<f32> {
        let dist_squared = self.def.position.distance_squared(listener);
        (dist_squared <= self.def.max_distance * self.def.max_distance).then_some(dist_squared)
    }

    fn calc_soft_volume(&mut self, enable: bool, dist_squared: f32) {
        self.soft_volume = if enable { self.attenuation(dist_squared) } else { 0.0 };
    }

    fn volume_rank(&self) -> f32 {
        self.soft_volume * self.def.volume
    }

    fn volume(&self) -> f32 {
        self.def.volume
    }

    fn priority(&self) -> u8 {
        self.def.priority
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn update_soft_volume(&mut self, enable: bool, force_hard_stop: bool) {
        if enable != self.playing {
            tracing::debug!("{} {}", self.def.name, if enable { "starts" } else { "stops" });
        }
        if force_hard_stop {
            self.hard_stops += 1;
        }
        self.playing = enable;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn disable(&mut self) {
        self.soft_volume = 0.0;
    }

    fn force_unregister(&mut self) {
        self.registered = false;
        self.playing = false;
    }

    fn channel(&self) -> AudioChannel {
        self.def.channel
    }

    fn name(&self) -> &str {
        &self.def.name
    }
}

// ============================================================================
// Simulated regions
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimRegion {
    pub def: RegionDef,
    properties: ReverbProperties,
    strength: f32,
}

impl SimRegion {
    pub fn new(def: RegionDef) -> Self {
        Self {
            properties: def.preset.properties(),
            def,
            strength: 0.0,
        }
    }

    /// Recompute the strength for a listener at `listener`
    pub fn update_strength(&mut self, listener: Vec3) {
        let distance = self.def.center.distance(listener);
        self.strength = if distance <= self.def.inner_radius {
            1.0
        } else if distance >= self.def.outer_radius {
            0.0
        } else {
            (self.def.outer_radius - distance) / (self.def.outer_radius - self.def.inner_radius)
        };
    }
}

impl ReverbRegion for SimRegion {
    fn strength(&self) -> f32 {
        self.strength
    }

    fn properties(&self) -> &ReverbProperties {
        &self.properties
    }

    fn name(&self) -> &str {
        &self.def.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [listener]
        waypoints = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 10.0, 0.0]]

        [[sounds]]
        key = 1
        name = "waterfall"
        priority = 2
        position = [0.0, 0.0, 0.0]
        max_distance = 20.0
        channel = "ambience"

        [[regions]]
        key = 7
        preset = "cave"
        center = [0.0, 0.0, 0.0]
        inner_radius = 2.0
        outer_radius = 6.0
    "#;

    #[test]
    fn test_parse_scene() {
        let scene = parse(SCENE).unwrap();
        assert_eq!(scene.sounds.len(), 1);
        assert_eq!(scene.sounds[0].channel, AudioChannel::Ambience);
        assert_eq!(scene.sounds[0].min_distance, 1.0);
        assert_eq!(scene.regions[0].preset, ReverbPreset::Cave);
    }

    #[test]
    fn test_parse_rejects_inverted_region() {
        let bad = SCENE.replace("outer_radius = 6.0", "outer_radius = 1.0");
        assert!(parse(&bad).is_err());
    }

    #[test]
    fn test_listener_path() {
        let path = parse(SCENE).unwrap().listener;
        assert_eq!(path.position_at(0.0), Vec3::ZERO);
        assert_eq!(path.position_at(0.25), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(path.position_at(1.0), Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(path.position_at(2.0), Vec3::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn test_sound_attenuation() {
        let scene = parse(SCENE).unwrap();
        let mut sound = SimSound::new(scene.sounds[0].clone());

        let d2 = sound.is_within_range(Vec3::new(4.0, 0.0, 0.0)).unwrap();
        sound.calc_soft_volume(true, d2);
        assert_eq!(sound.volume_rank(), 0.25);

        assert!(sound.is_within_range(Vec3::new(30.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_region_strength_falloff() {
        let scene = parse(SCENE).unwrap();
        let mut region = SimRegion::new(scene.regions[0].clone());

        region.update_strength(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(region.strength(), 1.0);
        region.update_strength(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(region.strength(), 0.5);
        region.update_strength(Vec3::new(8.0, 0.0, 0.0));
        assert_eq!(region.strength(), 0.0);
    }
}
