//! End-to-end tests driving the controller through whole sessions:
//! activation, crowded scenes, walking out of range, overlapping reverb
//! regions and restarts.

use std::time::{Duration, Instant};

use hashbrown::HashMap;

use crate::backend::NullBackend;
use crate::config::AudioSettings;
use crate::message::{AudioEvent, AudioNotice};
use crate::reverb::{RegionKey, ReverbProperties};
use crate::selector::Activation;
use crate::sound::SoundKey;
use crate::system::{AudioSystem, LifecycleState};
use crate::test_utils::{MockRegion, MockSound, RecordingBackend};

type Sounds = HashMap<SoundKey, MockSound>;
type Regions = HashMap<RegionKey, MockRegion>;

// ============================================================================
// Helpers
// ============================================================================

/// Ten equal-priority sounds, louder with higher keys
fn crowd(sys: &mut AudioSystem<RecordingBackend>) -> Sounds {
    let mut sounds = Sounds::new();
    for i in 0..10u32 {
        let key = SoundKey(i);
        sounds.insert(key, MockSound::new(1, (i + 1) as f32 / 10.0));
        sys.register_soft_sound(key);
    }
    sounds
}

fn running(voice_limit: u32, settings: AudioSettings) -> AudioSystem<RecordingBackend> {
    let mut sys = AudioSystem::new(RecordingBackend::new(voice_limit), settings);
    assert!(sys.activate(true));
    sys.handle_event(AudioEvent::AgeLoaded { loaded: true }, &mut Sounds::new());
    sys
}

// ============================================================================
// Crowded scenes
// ============================================================================

#[test]
fn test_crowd_admits_loudest_and_stops_the_rest() {
    let t0 = Instant::now();
    let mut sys = running(8, AudioSettings::default());
    let mut sounds = crowd(&mut sys);
    assert_eq!(sys.max_active_sounds(), 4);

    let pass = sys.tick(t0, &mut sounds, &Regions::new()).unwrap();

    assert_eq!(pass.promoted, 10);
    let enabled: Vec<_> = pass.enabled().collect();
    assert_eq!(enabled, vec![SoundKey(9), SoundKey(8), SoundKey(7), SoundKey(6)]);

    for i in [5, 4] {
        assert_eq!(sounds[&SoundKey(i)].last_soft_call(), Some((false, false)), "sound {i}");
    }
    for i in 0..4 {
        assert_eq!(sounds[&SoundKey(i)].last_soft_call(), Some((false, true)), "sound {i}");
    }
    assert_eq!(
        pass.decisions[4].activation,
        Activation::Stop { hard: false }
    );
    assert_eq!(pass.report.enabled().count(), 4);
}

#[test]
fn test_walking_away_frees_voices() {
    let t0 = Instant::now();
    let mut sys = running(8, AudioSettings::default());
    let mut sounds = crowd(&mut sys);
    sys.tick(t0, &mut sounds, &Regions::new());

    for i in [9, 8] {
        sounds.get_mut(&SoundKey(i)).unwrap().in_range = None;
    }
    let pass = sys.tick(t0 + Duration::from_millis(200), &mut sounds, &Regions::new()).unwrap();

    assert_eq!(pass.demoted, 2);
    let enabled: Vec<_> = pass.enabled().collect();
    assert_eq!(enabled, vec![SoundKey(7), SoundKey(6), SoundKey(5), SoundKey(4)]);
    assert_eq!(sounds[&SoundKey(9)].disable_count, 0);
    assert_eq!(sys.registry().active_len(), 8);
    assert_eq!(sys.registry().region_len(), 2);

    sys.tick(t0 + Duration::from_millis(400), &mut sounds, &Regions::new());
    assert_eq!(sounds[&SoundKey(9)].disable_count, 1);
    assert_eq!(sys.registry().region_len(), 2);
}

#[test]
fn test_no_promotion_before_age_loads() {
    let t0 = Instant::now();
    let mut sys = AudioSystem::new(RecordingBackend::new(8), AudioSettings::default());
    sys.activate(true);
    let mut sounds = crowd(&mut sys);

    let pass = sys.tick(t0, &mut sounds, &Regions::new()).unwrap();
    assert!(pass.decisions.is_empty());

    sys.handle_event(AudioEvent::AgeLoaded { loaded: true }, &mut sounds);
    let pass = sys.tick(t0 + Duration::from_millis(200), &mut sounds, &Regions::new()).unwrap();
    assert_eq!(pass.enabled().count(), 4);
}

// ============================================================================
// Reverb
// ============================================================================

#[test]
fn test_overlapping_regions_morph_at_limited_rate() {
    let t0 = Instant::now();
    let mut settings = AudioSettings::default();
    settings.update_interval_ms = 20;
    let mut sys = running(32, settings);
    let mut sounds = Sounds::new();

    let mut regions = Regions::new();
    regions.insert(RegionKey(1), MockRegion::new(0.5, ReverbProperties::CAVE));
    regions.insert(RegionKey(2), MockRegion::new(0.5, ReverbProperties::HALLWAY));
    sys.handle_event(AudioEvent::RegionAttached(RegionKey(1)), &mut sounds);
    sys.handle_event(AudioEvent::RegionAttached(RegionKey(2)), &mut sounds);

    sys.tick(t0, &mut sounds, &regions);
    let expected = ReverbProperties::CAVE.interpolate(&ReverbProperties::HALLWAY, 0.5);
    assert_eq!(sys.backend().reverb_writes, vec![expected]);

    sys.tick(t0 + Duration::from_millis(30), &mut sounds, &regions);
    sys.tick(t0 + Duration::from_millis(60), &mut sounds, &regions);
    assert_eq!(sys.backend().reverb_writes.len(), 1);

    sys.tick(t0 + Duration::from_millis(110), &mut sounds, &regions);
    assert_eq!(sys.backend().reverb_writes.len(), 2);
}

#[test]
fn test_single_region_written_once() {
    let t0 = Instant::now();
    let mut sys = running(32, AudioSettings::default());
    let mut sounds = Sounds::new();
    let mut regions = Regions::new();
    regions.insert(RegionKey(1), MockRegion::new(1.0, ReverbProperties::ROOM));
    sys.handle_event(AudioEvent::RegionAttached(RegionKey(1)), &mut sounds);

    for step in 0..5u64 {
        sys.tick(t0 + Duration::from_millis(step * 200), &mut sounds, &regions);
    }

    assert_eq!(sys.backend().reverb_writes, vec![ReverbProperties::ROOM]);
    assert_eq!(sys.reverb().writes(), 1);
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_restart_mid_session() {
    let t0 = Instant::now();
    let mut sys = running(8, AudioSettings::default());
    let mut sounds = crowd(&mut sys);
    sys.tick(t0, &mut sounds, &Regions::new());

    assert!(sys.restart());
    sys.tick(t0 + Duration::from_millis(200), &mut sounds, &Regions::new());

    assert_eq!(sys.state(), LifecycleState::Active);
    assert!(sounds.values().all(|s| s.force_unregistered));
    assert!(sys.registry().is_empty());
    assert_eq!(
        sys.take_notices(),
        vec![AudioNotice::Activate, AudioNotice::Deactivate, AudioNotice::Activate]
    );
    assert_eq!(sys.backend().close_count, 1);
}

#[test]
fn test_null_backend_session() {
    let t0 = Instant::now();
    let mut sys = AudioSystem::new(NullBackend::default(), AudioSettings::default());
    let mut sounds = Sounds::new();

    assert!(sys.activate(true));
    assert!(sys.backend().is_open());
    assert!(!sys.using_reverb());
    assert!(sys.tick(t0, &mut sounds, &Regions::new()).is_some());

    assert!(sys.activate(false));
    sys.tick(t0 + Duration::from_millis(200), &mut sounds, &Regions::new());
    assert_eq!(sys.state(), LifecycleState::Uninitialized);
    assert!(!sys.backend().is_open());
}
