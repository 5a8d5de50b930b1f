//! Drives an [`AudioSystem`] through a scene frame by frame

use std::fmt;
use std::time::Instant;

use anyhow::{Result, bail};
use glam::Vec3;
use hashbrown::HashMap;
use plasma_audio_core::{
    ActiveSoundRow, AudioBackend, AudioEvent, AudioSettings, AudioSystem, BackendError, DEFAULT_DEVICE, DebugStat,
    DeviceCaps, RegionKey, ReverbProperties, ReverbRegion, SoundKey,
};

use crate::scene::{ListenerPath, Scene, SimRegion, SimSound};

/// Device stand-in that keeps the last state written to it
#[derive(Debug, Default)]
pub struct SimBackend {
    voice_limit: u32,
    pub gain: f32,
    pub reverb: Option<ReverbProperties>,
    pub reverb_writes: u32,
}

impl SimBackend {
    pub fn new(voice_limit: u32) -> Self {
        Self {
            voice_limit,
            ..Self::default()
        }
    }
}

impl AudioBackend for SimBackend {
    fn open(&mut self, device: Option<&str>) -> Result<DeviceCaps, BackendError> {
        tracing::info!("Opening simulated device {}", device.unwrap_or(DEFAULT_DEVICE));
        Ok(DeviceCaps {
            voice_limit: self.voice_limit,
        })
    }

    fn close(&mut self) {
        tracing::info!("Closing simulated device");
    }

    fn set_global_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    fn init_reverb(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_reverb_properties(&mut self, props: &ReverbProperties) -> Result<(), BackendError> {
        self.reverb = Some(*props);
        self.reverb_writes += 1;
        Ok(())
    }
}

/// What one soft-volume pass decided
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: u32,
    pub listener: Vec3,
    pub playing: Vec<String>,
    pub ranked: usize,
    pub gain: f32,
    pub reverb_writes: u32,
    pub rows: Vec<ActiveSoundRow>,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {:4} @ ({:6.1}, {:6.1}, {:6.1})  gain {:.2}  reverb writes {:3}  {}/{} playing: {}",
            self.frame,
            self.listener.x,
            self.listener.y,
            self.listener.z,
            self.gain,
            self.reverb_writes,
            self.playing.len(),
            self.ranked,
            self.playing.join(", ")
        )
    }
}

pub struct Simulation {
    system: AudioSystem<SimBackend>,
    sounds: HashMap<SoundKey, SimSound>,
    regions: HashMap<RegionKey, SimRegion>,
    path: ListenerPath,
}

impl Simulation {
    /// Activate the audio system and register every scene sound
    pub fn new(scene: Scene, settings: AudioSettings, voices: u32) -> Result<Self> {
        let mut system = AudioSystem::new(SimBackend::new(voices), settings);
        if !system.activate(true) {
            bail!("Audio system failed to activate");
        }

        let mut sounds = HashMap::new();
        for def in scene.sounds {
            let sound = SimSound::new(def);
            system.register_soft_sound(sound.key());
            sounds.insert(sound.key(), sound);
        }
        let regions = scene
            .regions
            .into_iter()
            .map(|def| (RegionKey(def.key), SimRegion::new(def)))
            .collect();

        system.handle_event(AudioEvent::AgeLoaded { loaded: true }, &mut sounds);
        tracing::info!("Scene loaded with {} sounds", sounds.len());

        Ok(Self {
            system,
            sounds,
            regions,
            path: scene.listener,
        })
    }

    pub fn system(&self) -> &AudioSystem<SimBackend> {
        &self.system
    }

    pub fn sound(&self, key: SoundKey) -> Option<&SimSound> {
        self.sounds.get(&key)
    }

    /// Move the listener to `t` along its path and tick at `now`.
    /// Returns a report when a soft-volume pass ran.
    pub fn step(&mut self, frame: u32, t: f32, now: Instant) -> Option<FrameReport> {
        let listener = self.path.position_at(t);
        self.system.set_listener_position(listener);

        // Attach order decides blend order, so walk regions by key
        let mut keys: Vec<RegionKey> = self.regions.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let Some(region) = self.regions.get_mut(&key) else {
                continue;
            };
            let was_inside = region.strength() > 0.0;
            region.update_strength(listener);
            let inside = region.strength() > 0.0;
            if inside && !was_inside {
                self.system.handle_event(AudioEvent::RegionAttached(key), &mut self.sounds);
            } else if was_inside && !inside {
                self.system.handle_event(AudioEvent::RegionDetached(key), &mut self.sounds);
            }
        }

        let pass = self.system.tick(now, &mut self.sounds, &self.regions)?;
        let backend = self.system.backend();
        Some(FrameReport {
            frame,
            listener,
            playing: pass.report.enabled().map(|row| row.to_string()).collect(),
            ranked: pass.decisions.len(),
            gain: backend.gain,
            reverb_writes: backend.reverb_writes,
            rows: pass.report.rows,
        })
    }

    /// Take the system down and return its final statistics
    pub fn finish(&mut self) -> Vec<DebugStat> {
        let stats = self.system.debug_stats();
        self.system.activate(false);
        self.system.process_deferred(&mut self.sounds);
        for notice in self.system.take_notices() {
            tracing::debug!("Notice: {:?}", notice);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use plasma_audio_core::{LifecycleState, SoftSound};

    use super::*;
    use crate::scene;

    const CROWD: &str = r#"
        [listener]
        waypoints = [[0.0, 0.0, 0.0]]

        [[sounds]]
        key = 1
        name = "near"
        position = [1.0, 0.0, 0.0]
        max_distance = 50.0

        [[sounds]]
        key = 2
        name = "mid"
        position = [4.0, 0.0, 0.0]
        max_distance = 50.0

        [[sounds]]
        key = 3
        name = "far"
        position = [20.0, 0.0, 0.0]
        max_distance = 50.0

        [[regions]]
        key = 1
        preset = "room"
        center = [0.0, 0.0, 0.0]
        inner_radius = 5.0
        outer_radius = 10.0
    "#;

    #[test]
    fn test_step_admits_nearest_sounds() {
        let scene = scene::parse(CROWD).unwrap();
        let mut sim = Simulation::new(scene, AudioSettings::default(), 4).unwrap();

        let report = sim.step(0, 0.0, Instant::now()).unwrap();

        assert_eq!(sim.system().max_active_sounds(), 2);
        assert_eq!(report.ranked, 3);
        assert_eq!(report.playing.len(), 2);
        assert!(report.playing[0].ends_with("near"));
        assert!(report.playing[1].ends_with("mid"));
        assert!(!sim.sound(SoundKey(3)).unwrap().is_playing());
    }

    #[test]
    fn test_step_writes_region_reverb() {
        let scene = scene::parse(CROWD).unwrap();
        let mut sim = Simulation::new(scene, AudioSettings::default(), 32).unwrap();

        sim.step(0, 0.0, Instant::now());

        let backend = sim.system().backend();
        assert_eq!(backend.reverb, Some(ReverbProperties::ROOM));
        assert_eq!(sim.system().regions(), &[RegionKey(1)]);
    }

    #[test]
    fn test_overlapping_regions_attach_in_key_order() {
        let mut content = CROWD.to_string();
        for key in [9, 4, 6] {
            content.push_str(&format!(
                "[[regions]]\nkey = {key}\npreset = \"cave\"\ncenter = [0.0, 0.0, 0.0]\ninner_radius = 1.0\nouter_radius = 3.0\n"
            ));
        }
        let scene = scene::parse(&content).unwrap();
        let mut sim = Simulation::new(scene, AudioSettings::default(), 32).unwrap();

        sim.step(0, 0.0, Instant::now());

        assert_eq!(
            sim.system().regions(),
            &[RegionKey(1), RegionKey(4), RegionKey(6), RegionKey(9)]
        );
    }

    #[test]
    fn test_finish_shuts_down() {
        let scene = scene::parse(CROWD).unwrap();
        let mut sim = Simulation::new(scene, AudioSettings::default(), 32).unwrap();
        let start = Instant::now();
        sim.step(0, 0.0, start);
        sim.step(1, 1.0, start + Duration::from_millis(200));

        let stats = sim.finish();

        assert!(stats.iter().any(|s| s.name == "Passes" && s.value == "2"));
        assert_eq!(sim.system().state(), LifecycleState::Uninitialized);
        assert!(!sim.sound(SoundKey(1)).unwrap().registered);
    }
}
