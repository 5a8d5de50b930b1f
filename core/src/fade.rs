//! Global mute and fade volume

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeState {
    Idle,
    /// Requested; the clock starts on the next advance
    Pending,
    Running(Instant),
}

/// Master fade applied on top of every channel volume.
///
/// Muting pins the volume to 0 whatever a timed fade is doing. A timed
/// fade-in ramps from silence to full volume over `length`.
#[derive(Debug, Clone)]
pub struct GlobalFade {
    volume: f32,
    muted: bool,
    length: Duration,
    state: FadeState,
}

impl GlobalFade {
    pub fn new(length: Duration, muted: bool) -> Self {
        Self {
            volume: if muted { 0.0 } else { 1.0 },
            muted,
            length,
            state: FadeState::Idle,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_fading(&self) -> bool {
        self.state != FadeState::Idle
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    pub fn set_length(&mut self, length: Duration) {
        self.length = length;
    }

    /// Mute forces 0, unmute restores full volume
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.set_volume(if muted { 0.0 } else { 1.0 });
    }

    /// Set the fade scalar directly. Ignored while muted.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if self.muted { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    /// Fade in from silence. The ramp starts at the next [`advance`](Self::advance).
    pub fn request_fade_in(&mut self) {
        self.state = FadeState::Pending;
        self.set_volume(0.0);
    }

    /// Fade in from silence starting at `now`
    pub fn start_fade_in(&mut self, now: Instant) {
        tracing::info!("Starting fade over {:?}", self.length);
        self.state = FadeState::Running(now);
        self.set_volume(0.0);
    }

    /// Advance a running fade. Does nothing while muted; the ramp keeps
    /// following wall-clock time once unmuted.
    pub fn advance(&mut self, now: Instant) {
        if self.muted {
            return;
        }
        let start = match self.state {
            FadeState::Idle => return,
            FadeState::Pending => {
                self.start_fade_in(now);
                return;
            }
            FadeState::Running(start) => start,
        };
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.length {
            tracing::info!("Stopping fade after {:?}", elapsed);
            self.state = FadeState::Idle;
            self.set_volume(1.0);
        } else {
            self.set_volume(elapsed.as_secs_f32() / self.length.as_secs_f32());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LENGTH: Duration = Duration::from_secs(3);

    #[test]
    fn test_new_respects_muted() {
        assert_eq!(GlobalFade::new(LENGTH, true).volume(), 0.0);
        assert_eq!(GlobalFade::new(LENGTH, false).volume(), 1.0);
    }

    #[test]
    fn test_fade_in_ramps_then_holds() {
        let start = Instant::now();
        let mut fade = GlobalFade::new(LENGTH, false);
        fade.start_fade_in(start);
        assert_eq!(fade.volume(), 0.0);

        fade.advance(start + Duration::from_millis(1500));
        assert!((fade.volume() - 0.5).abs() < 1e-4);
        assert!(fade.is_fading());

        fade.advance(start + Duration::from_secs(4));
        assert_eq!(fade.volume(), 1.0);
        assert!(!fade.is_fading());

        fade.advance(start + Duration::from_secs(5));
        assert_eq!(fade.volume(), 1.0);
    }

    #[test]
    fn test_mute_overrides_fade() {
        let start = Instant::now();
        let mut fade = GlobalFade::new(LENGTH, false);
        fade.start_fade_in(start);
        fade.advance(start + Duration::from_secs(2));

        fade.set_muted(true);
        assert_eq!(fade.volume(), 0.0);

        fade.advance(start + Duration::from_millis(2500));
        assert_eq!(fade.volume(), 0.0);

        fade.set_volume(0.7);
        assert_eq!(fade.volume(), 0.0);
    }

    #[test]
    fn test_requested_fade_starts_on_next_advance() {
        let start = Instant::now();
        let mut fade = GlobalFade::new(LENGTH, false);
        fade.request_fade_in();
        assert!(fade.is_fading());
        assert_eq!(fade.volume(), 0.0);

        fade.advance(start);
        assert_eq!(fade.volume(), 0.0);

        fade.advance(start + Duration::from_millis(750));
        assert!((fade.volume() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_unmute_restores_full_volume() {
        let mut fade = GlobalFade::new(LENGTH, true);
        fade.set_muted(false);
        assert_eq!(fade.volume(), 1.0);
        assert!(!fade.is_muted());
    }
}
