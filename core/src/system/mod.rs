//! Audio system controller
//!
//! Owns the device lifecycle and the per-tick drive of the soft-volume
//! selector and reverb blender.
//!
//! ```text
//!                activate(true)            activate(false)
//! Uninitialized ──────────────► Active ───────────────────► Deactivating
//!       ▲          (opens device)                               │
//!       │                                           Destroy event│
//!       └──────────────────── ShuttingDown ◄────────────────────┘
//! ```
//!
//! Deactivation is two-phase: the `Deactivate` notice goes out first and
//! the actual teardown waits for a deferred `Destroy` event, so listeners
//! get to react while the device is still open.


use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::Vec3;

use crate::backend::{self, AudioBackend, DEFAULT_DEVICE, DeviceCaps, DistanceModel};
use crate::config::AudioSettings;
use crate::diagnostics::DebugStat;
use crate::error::BackendError;
use crate::fade::GlobalFade;
use crate::message::{AudioEvent, AudioNotice};
use crate::registry::{NodeId, SoundRegistry};
use crate::reverb::{RegionKey, RegionLookup, ReverbBlender, SourceParams, SourceReverbSettings};
use crate::selector::{RankedSelector, SelectorContext, SoftPass};
use crate::sound::{AudioChannel, SoundKey, SoundLookup};

/// Listener position before the first update
pub const UNSET_LISTENER_POSITION: Vec3 = Vec3::splat(-1.0e30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    /// Opening the device
    Initializing,
    Active,
    /// Waiting for the deferred destroy
    Deactivating,
    ShuttingDown,
}

/// The audio system controller.
pub struct AudioSystem<B: AudioBackend> {
    backend: B,
    settings: AudioSettings,
    state: LifecycleState,

    registry: SoundRegistry,
    selector: RankedSelector,
    reverb: ReverbBlender,
    /// Attached reverb regions in attach order
    regions: Vec<RegionKey>,
    using_reverb: bool,

    fade: GlobalFade,
    /// Set by `set_muted`, consumed by the next soft-volume pass
    mute_state_change: bool,

    restart_on_destruct: bool,
    waiting_for_shutdown: bool,
    deferred: VecDeque<AudioEvent>,
    notices: Vec<AudioNotice>,

    device_name: String,
    voice_limit: u32,
    last_update: Option<Instant>,
    listener_position: Vec3,
    /// Position saved when the age unloaded
    last_listener_position: Vec3,
    listener_initialized: bool,
    passes: u64,
}

impl<B: AudioBackend> AudioSystem<B> {
    pub fn new(backend: B, settings: AudioSettings) -> Self {
        let fade = GlobalFade::new(settings.fade_length(), settings.muted);
        Self {
            backend,
            state: LifecycleState::Uninitialized,
            registry: SoundRegistry::new(),
            selector: RankedSelector::new(),
            reverb: ReverbBlender::new(),
            regions: Vec::new(),
            using_reverb: false,
            fade,
            mute_state_change: false,
            restart_on_destruct: false,
            waiting_for_shutdown: false,
            deferred: VecDeque::new(),
            notices: Vec::new(),
            device_name: String::new(),
            voice_limit: 0,
            last_update: None,
            listener_position: UNSET_LISTENER_POSITION,
            last_listener_position: UNSET_LISTENER_POSITION,
            listener_initialized: false,
            passes: 0,
            settings,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bring the system up (`true`) or start taking it down (`false`).
    ///
    /// Returns whether the requested transition happened. Bringing the
    /// system up fails if audio is disabled or no device opens; taking it
    /// down only queues the teardown.
    pub fn activate(&mut self, on: bool) -> bool {
        if on {
            self.start()
        } else {
            self.stop()
        }
    }

    fn start(&mut self) -> bool {
        if self.state != LifecycleState::Uninitialized {
            return self.state == LifecycleState::Active;
        }
        if !self.settings.enabled {
            tracing::info!("Audio disabled, not activating");
            return false;
        }

        tracing::info!("Attempting audio system init");
        self.state = LifecycleState::Initializing;
        let caps = match self.open_device() {
            Ok(caps) => caps,
            Err(e) => {
                tracing::error!("Audio system init failed: {}", e);
                self.state = LifecycleState::Uninitialized;
                return false;
            }
        };
        tracing::info!("Device init success: {}", self.friendly_device_name());

        self.voice_limit = caps.voice_limit;
        tracing::info!("Max number of sources: {}", caps.voice_limit);
        self.selector.set_voice_limit(caps.voice_limit);
        self.backend.set_distance_model(self.settings.distance_model);

        self.using_reverb = self.settings.reverb_enabled && self.init_reverb();
        self.reverb.clear_cache();

        self.state = LifecycleState::Active;
        self.notices.push(AudioNotice::Activate);

        if self.fade.is_muted() {
            self.mute_state_change = true;
        } else {
            self.set_muted(true);
            self.deferred.push_back(AudioEvent::UnmuteAll { fade_in: true });
        }
        self.backend.set_global_gain(self.fade.volume());
        true
    }

    fn open_device(&mut self) -> Result<DeviceCaps, BackendError> {
        let requested = self.settings.device.clone();
        if !backend::is_default_device(&requested) {
            tracing::info!("Device '{}' selected", requested);
            match self.backend.open(Some(&requested)) {
                Ok(caps) => {
                    self.device_name = requested;
                    return Ok(caps);
                }
                Err(e) => tracing::error!("{}, retrying with default device", e),
            }
        }

        self.device_name = DEFAULT_DEVICE.to_string();
        self.backend.open(None)
    }

    fn init_reverb(&mut self) -> bool {
        match self.backend.init_reverb() {
            Ok(()) => {
                tracing::info!("Reverb support detected and enabled");
                true
            }
            Err(e) => {
                tracing::warn!("Reverb effects disabled: {}", e);
                false
            }
        }
    }

    fn stop(&mut self) -> bool {
        if self.state != LifecycleState::Active {
            return false;
        }
        tracing::info!("Sending deactivate/destroy messages");
        self.notices.push(AudioNotice::Deactivate);
        self.waiting_for_shutdown = true;
        self.deferred.push_back(AudioEvent::Destroy);
        self.state = LifecycleState::Deactivating;
        true
    }

    /// Tear down and bring the system back up once teardown finishes.
    pub fn restart(&mut self) -> bool {
        match self.state {
            LifecycleState::Active => {
                self.restart_on_destruct = true;
                self.stop()
            }
            LifecycleState::Deactivating => {
                self.restart_on_destruct = true;
                true
            }
            LifecycleState::Uninitialized => self.start(),
            LifecycleState::Initializing | LifecycleState::ShuttingDown => false,
        }
    }

    fn shutdown<L>(&mut self, sounds: &mut L)
    where
        L: SoundLookup + ?Sized,
    {
        self.state = LifecycleState::ShuttingDown;
        self.waiting_for_shutdown = false;

        for key in self.registry.drain() {
            if let Some(sound) = sounds.sound_mut(key) {
                sound.force_unregister();
            }
        }
        self.regions.clear();
        self.reverb.clear_cache();
        if self.using_reverb {
            self.backend.shutdown_reverb();
            self.using_reverb = false;
        }
        self.backend.close();

        self.listener_position = UNSET_LISTENER_POSITION;
        self.last_update = None;
        self.state = LifecycleState::Uninitialized;
        tracing::info!("Audio system shut down");

        if self.restart_on_destruct {
            self.restart_on_destruct = false;
            self.start();
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Deliver one event.
    pub fn handle_event<L>(&mut self, event: AudioEvent, sounds: &mut L)
    where
        L: SoundLookup + ?Sized,
    {
        match event {
            AudioEvent::Ping { sender } => {
                if self.listener_initialized {
                    self.notices.push(AudioNotice::ActivateTo(sender));
                }
            }
            AudioEvent::UnmuteAll { fade_in } => {
                self.set_muted(false);
                if fade_in {
                    self.fade.request_fade_in();
                }
                self.push_gain();
            }
            AudioEvent::Destroy => {
                if self.waiting_for_shutdown {
                    self.shutdown(sounds);
                }
            }
            AudioEvent::AgeLoaded { loaded } => {
                if !loaded {
                    self.last_listener_position = self.listener_position;
                }
                self.listener_initialized = loaded;
            }
            AudioEvent::RegionAttached(key) => {
                if !self.regions.contains(&key) {
                    self.regions.push(key);
                }
                self.reverb.clear_cache();
            }
            AudioEvent::RegionDetached(key) => {
                self.regions.retain(|r| *r != key);
                self.reverb.clear_cache();
            }
        }
    }

    /// Deliver the events the system queued for itself. Events queued
    /// while these run wait for the next call.
    pub fn process_deferred<L>(&mut self, sounds: &mut L)
    where
        L: SoundLookup + ?Sized,
    {
        let pending = std::mem::take(&mut self.deferred);
        for event in pending {
            self.handle_event(event, sounds);
        }
    }

    /// Notices emitted since the last call
    pub fn take_notices(&mut self) -> Vec<AudioNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Per-frame update.
    ///
    /// Delivers deferred events, advances the fade and pushes the listener
    /// gain. At most once per update interval it also runs a soft-volume
    /// pass and, with reverb in use, a reverb blend. Returns the pass if
    /// one ran.
    pub fn tick<L, R>(&mut self, now: Instant, sounds: &mut L, regions: &R) -> Option<SoftPass>
    where
        L: SoundLookup + ?Sized,
        R: RegionLookup + ?Sized,
    {
        self.process_deferred(sounds);
        if self.state != LifecycleState::Active {
            return None;
        }

        self.fade.advance(now);
        self.push_gain();

        let interval = Duration::from_millis(self.settings.update_interval_ms);
        if let Some(last) = self.last_update
            && now.saturating_duration_since(last) <= interval
        {
            return None;
        }

        let ctx = SelectorContext {
            priority_cutoff: self.settings.priority_cutoff,
            listener_initialized: self.listener_initialized,
            mute_change: self.mute_state_change.then_some(self.fade.is_muted()),
        };
        let pass = self
            .selector
            .update(&mut self.registry, sounds, self.listener_position, &ctx);
        self.mute_state_change = false;

        if self.using_reverb {
            self.reverb.process(&mut self.backend, &self.regions, regions, now);
        }

        self.last_update = Some(now);
        self.passes += 1;
        if self.settings.extended_logs {
            tracing::debug!(
                "Pass {}: {} ranked, {} enabled, {} promoted, {} demoted",
                self.passes,
                pass.decisions.len(),
                pass.enabled().count(),
                pass.promoted,
                pass.demoted
            );
        }
        Some(pass)
    }

    fn push_gain(&mut self) {
        if self.state == LifecycleState::Active {
            self.backend.set_global_gain(self.fade.volume());
        }
    }

    // ------------------------------------------------------------------
    // Sounds
    // ------------------------------------------------------------------

    pub fn register_soft_sound(&mut self, key: SoundKey) -> NodeId {
        self.registry.register(key)
    }

    /// Returns false if the sound was not registered
    pub fn unregister_soft_sound(&mut self, key: SoundKey) -> bool {
        let found = self.registry.unregister(key);
        if !found {
            tracing::debug!("Unregistering {} which was not registered", key);
        }
        found
    }

    /// Push a source's changed reverb send groups, or all of them with
    /// `force`. Returns whether the backend accepted a write; the dirty
    /// groups are cleared only then.
    pub fn apply_source_reverb(&mut self, source: SoundKey, settings: &mut SourceReverbSettings, force: bool) -> bool {
        if self.state != LifecycleState::Active || !self.using_reverb {
            return false;
        }
        let params = if force { SourceParams::ALL } else { settings.dirty() };
        if params.is_empty() {
            return false;
        }
        match self.backend.set_source_reverb(source, settings, params) {
            Ok(()) => {
                settings.clear_dirty();
                true
            }
            Err(e) => {
                tracing::error!("Failed to apply reverb settings to {}: {}", source, e);
                false
            }
        }
    }

    /// Step the debug sound cursor
    pub fn next_debug_sound(&mut self) -> Option<SoundKey> {
        self.registry.next_debug_sound()
    }

    // ------------------------------------------------------------------
    // Mute, fade and volume
    // ------------------------------------------------------------------

    pub fn set_muted(&mut self, muted: bool) {
        self.fade.set_muted(muted);
        self.mute_state_change = true;
        self.push_gain();
    }

    pub fn is_muted(&self) -> bool {
        self.fade.is_muted()
    }

    /// Set the fade scalar directly. Ignored while muted.
    pub fn set_global_fade_volume(&mut self, volume: f32) {
        self.fade.set_volume(volume);
        self.push_gain();
    }

    pub fn global_fade_volume(&self) -> f32 {
        self.fade.volume()
    }

    pub fn set_fade_length(&mut self, secs: f32) {
        self.settings.fade_length_secs = secs.max(0.0);
        self.fade.set_length(self.settings.fade_length());
    }

    pub fn fade_length(&self) -> Duration {
        self.fade.length()
    }

    pub fn set_channel_volume(&mut self, channel: AudioChannel, volume: f32) {
        self.settings.channel_volumes[channel.index()] = volume.clamp(0.0, 1.0);
    }

    pub fn channel_volume(&self, channel: AudioChannel) -> f32 {
        self.settings.channel_volume(channel)
    }

    /// Channel volume with the global fade applied
    pub fn channel_gain(&self, channel: AudioChannel) -> f32 {
        self.channel_volume(channel) * self.fade.volume()
    }

    // ------------------------------------------------------------------
    // Priority and listener
    // ------------------------------------------------------------------

    pub fn set_priority_cutoff(&mut self, cutoff: u8) {
        self.settings.priority_cutoff = cutoff;
        self.selector.set_voice_limit(self.voice_limit);
    }

    pub fn priority_cutoff(&self) -> u8 {
        self.settings.priority_cutoff
    }

    pub fn set_listener_position(&mut self, position: Vec3) {
        self.listener_position = position;
        if self.state == LifecycleState::Active {
            self.backend.set_listener_position(position);
        }
    }

    /// Forwarded as zero unless doppler is enabled
    pub fn set_listener_velocity(&mut self, velocity: Vec3) {
        let velocity = if self.settings.doppler { velocity } else { Vec3::ZERO };
        if self.state == LifecycleState::Active {
            self.backend.set_listener_velocity(velocity);
        }
    }

    pub fn set_listener_orientation(&mut self, forward: Vec3, up: Vec3) {
        if self.state == LifecycleState::Active {
            self.backend.set_listener_orientation(forward, up);
        }
    }

    pub fn set_doppler(&mut self, enabled: bool) {
        self.settings.doppler = enabled;
    }

    /// Toggle environmental reverb. An active system restarts so the
    /// device is reopened with the new setting.
    pub fn set_reverb_enabled(&mut self, enabled: bool) {
        self.settings.reverb_enabled = enabled;
        if self.state == LifecycleState::Active {
            tracing::info!("Reverb {}, restarting audio system", if enabled { "enabled" } else { "disabled" });
            self.restart();
        }
    }

    pub fn set_distance_model(&mut self, model: DistanceModel) {
        self.settings.distance_model = model;
        if self.state == LifecycleState::Active {
            self.backend.set_distance_model(model);
        }
    }

    pub fn listener_position(&self) -> Vec3 {
        self.listener_position
    }

    /// Position the listener had when the last age unloaded
    pub fn last_listener_position(&self) -> Vec3 {
        self.last_listener_position
    }

    pub fn listener_initialized(&self) -> bool {
        self.listener_initialized
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry(&self) -> &SoundRegistry {
        &self.registry
    }

    pub fn selector(&self) -> &RankedSelector {
        &self.selector
    }

    pub fn reverb(&self) -> &ReverbBlender {
        &self.reverb
    }

    pub fn regions(&self) -> &[RegionKey] {
        &self.regions
    }

    pub fn using_reverb(&self) -> bool {
        self.using_reverb
    }

    pub fn max_active_sounds(&self) -> usize {
        self.selector.max_active()
    }

    /// Opened device name with implementation prefixes removed
    pub fn friendly_device_name(&self) -> &str {
        backend::friendly_device_name(&self.device_name)
    }

    pub fn debug_stats(&self) -> Vec<DebugStat> {
        vec![
            DebugStat::new("State", format!("{:?}", self.state)),
            DebugStat::new("Device", self.friendly_device_name()),
            DebugStat::number("Registered", self.registry.len()),
            DebugStat::number("Active", self.registry.active_len()),
            DebugStat::number("Max active", self.selector.max_active()),
            DebugStat::number("Slop", self.selector.slop()),
            DebugStat::number("Priority cutoff", self.settings.priority_cutoff),
            DebugStat::percent("Fade", self.fade.volume()),
            DebugStat::number("Reverb regions", self.regions.len()),
            DebugStat::number("Reverb writes", self.reverb.writes()),
            DebugStat::number("Passes", self.passes),
        ]
    }
}
