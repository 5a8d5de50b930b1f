//! Soft-volume ranking and voice admission
//!
//! Each pass re-ranks every registered sound the listener can hear and
//! admits the best `max_active` of them. Sounds just past the cutoff get a
//! gentle stop so a sound hovering at the boundary does not pop; the rest
//! are stopped hard.


use glam::Vec3;

use crate::diagnostics::{ActiveSoundReport, ActiveSoundRow};
use crate::registry::{NodeId, SoftList, SoundRegistry};
use crate::sound::{SoftSound, SoundKey, SoundLookup};

/// Upper bound on simultaneously admitted sounds
pub const DEFAULT_MAX_ACTIVE: usize = 24;

/// Admission limit for a device with `voice_limit` voices (0 = unknown).
///
/// Half the device's voices are kept in reserve for one-shot sounds.
pub fn max_active_for(voice_limit: u32) -> usize {
    if voice_limit == 0 {
        DEFAULT_MAX_ACTIVE
    } else {
        DEFAULT_MAX_ACTIVE.min(voice_limit as usize / 2)
    }
}

/// Rank used to order sounds: urgent and loud sounds rank higher
pub fn composite_rank(priority: u8, volume_rank: f32) -> f32 {
    (10.0 - f32::from(priority)) * volume_rank
}

/// Per-pass inputs owned by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorContext {
    /// Sounds with a priority number above this are ignored
    pub priority_cutoff: u8,
    /// Without a valid listener frame no sound is promoted
    pub listener_initialized: bool,
    /// Mute state to push to every sound visited this pass
    pub mute_change: Option<bool>,
}

/// A sound queued for the activation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankEntry {
    pub node: NodeId,
    pub key: SoundKey,
    pub rank: f32,
}

/// What the activation pass told a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Enable,
    /// `hard` drops all fade state and silences immediately
    Stop { hard: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftDecision {
    pub key: SoundKey,
    pub rank: f32,
    pub activation: Activation,
}

/// Result of one [`RankedSelector::update`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftPass {
    /// Decisions in rank order
    pub decisions: Vec<SoftDecision>,
    pub promoted: usize,
    pub demoted: usize,
    pub report: ActiveSoundReport,
}

impl SoftPass {
    pub fn enabled(&self) -> impl Iterator<Item = SoundKey> + '_ {
        self.decisions
            .iter()
            .filter(|d| d.activation == Activation::Enable)
            .map(|d| d.key)
    }
}

/// Ranks registered sounds and decides which may play
#[derive(Debug, Clone)]
pub struct RankedSelector {
    max_active: usize,
    slop: usize,
    ranking: Vec<RankEntry>,
}

impl Default for RankedSelector {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_ACTIVE, DEFAULT_MAX_ACTIVE / 2)
    }
}

impl RankedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_active: usize, slop: usize) -> Self {
        Self {
            max_active,
            slop,
            ranking: Vec::new(),
        }
    }

    /// Derive the admission limit and slop from the device voice count
    pub fn set_voice_limit(&mut self, voice_limit: u32) {
        self.max_active = max_active_for(voice_limit);
        self.slop = self.max_active / 2;
        tracing::info!("Max number of sounds set to {}", self.max_active);
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Positions past `max_active` that still only get a gentle stop
    pub fn slop(&self) -> usize {
        self.slop
    }

    /// Ranking built by the last pass, best first
    pub fn ranking(&self) -> &[RankEntry] {
        &self.ranking
    }

    /// Run one full pass for a listener at `listener`.
    ///
    /// Active sounds that fell out of range, lost their rank or were
    /// unloaded go back to the region list. Region sounds that came into
    /// range are promoted. Everything still active is then sorted and
    /// admitted up to the limit. Each sound is visited at most once.
    pub fn update<L>(
        &mut self,
        registry: &mut SoundRegistry,
        sounds: &mut L,
        listener: Vec3,
        ctx: &SelectorContext,
    ) -> SoftPass
    where
        L: SoundLookup + ?Sized,
    {
        let mut pass = SoftPass::default();
        self.ranking.clear();

        // Sounds demoted below join the region list but wait for the next pass
        let waiting: Vec<NodeId> = registry.iter(SoftList::Region).map(|(node, _)| node).collect();

        // Demote
        let active: Vec<NodeId> = registry.iter(SoftList::Active).map(|(node, _)| node).collect();
        for node in active {
            let Some(key) = registry.key(node) else {
                continue;
            };
            let rank = sounds
                .sound_mut(key)
                .and_then(|sound| rank_active(sound, listener, ctx));
            match rank {
                Some(rank) => self.ranking.push(RankEntry { node, key, rank }),
                None => {
                    registry.move_to(node, SoftList::Region);
                    if let Some(sound) = sounds.sound_mut(key) {
                        sound.update_soft_volume(false, false);
                    }
                    pass.demoted += 1;
                }
            }
        }

        // Promote
        if ctx.listener_initialized {
            for node in waiting {
                let Some(key) = registry.key(node) else {
                    continue;
                };
                let Some(sound) = sounds.sound_mut(key) else {
                    continue;
                };
                if sound.priority() > ctx.priority_cutoff {
                    continue;
                }
                sound.update();
                if let Some(muted) = ctx.mute_change {
                    sound.set_muted(muted);
                }

                let Some(dist_squared) = sound.is_within_range(listener) else {
                    sound.disable();
                    continue;
                };
                sound.calc_soft_volume(true, dist_squared);
                let volume_rank = sound.volume_rank();
                if volume_rank > 0.0 {
                    let rank = composite_rank(sound.priority(), volume_rank);
                    registry.move_to(node, SoftList::Active);
                    self.ranking.push(RankEntry { node, key, rank });
                    pass.promoted += 1;
                } else if sound.is_playing() {
                    sound.update_soft_volume(false, false);
                }
            }
        }

        // Stable: equal ranks keep queue order
        self.ranking.sort_by(|a, b| b.rank.total_cmp(&a.rank));

        // Activate
        let mut position = 0;
        for entry in &self.ranking {
            let Some(sound) = sounds.sound_mut(entry.key) else {
                continue;
            };
            let activation = if position < self.max_active {
                Activation::Enable
            } else {
                Activation::Stop {
                    hard: position >= self.max_active + self.slop,
                }
            };
            match activation {
                Activation::Enable => sound.update_soft_volume(true, false),
                Activation::Stop { hard } => sound.update_soft_volume(false, hard),
            }

            pass.report.rows.push(report_row(sound, entry, activation));
            pass.decisions.push(SoftDecision {
                key: entry.key,
                rank: entry.rank,
                activation,
            });
            position += 1;
        }

        tracing::trace!(
            "Soft pass: {} ranked, {} promoted, {} demoted",
            pass.decisions.len(),
            pass.promoted,
            pass.demoted
        );
        pass.report.log();
        pass
    }
}

/// Rank an active sound, or `None` if it should be demoted
fn rank_active(sound: &mut dyn SoftSound, listener: Vec3, ctx: &SelectorContext) -> Option<f32> {
    sound.update();
    if let Some(muted) = ctx.mute_change {
        sound.set_muted(muted);
    }
    let dist_squared = sound.is_within_range(listener)?;
    if sound.priority() > ctx.priority_cutoff {
        return None;
    }
    sound.calc_soft_volume(true, dist_squared);
    let volume_rank = sound.volume_rank();
    (volume_rank > 0.0).then(|| composite_rank(sound.priority(), volume_rank))
}

fn report_row(sound: &dyn SoftSound, entry: &RankEntry, activation: Activation) -> ActiveSoundRow {
    let volume = sound.volume();
    ActiveSoundRow {
        key: entry.key,
        priority: sound.priority(),
        rank: entry.rank,
        soft_volume: if volume > 0.0 { sound.volume_rank() / volume } else { 0.0 },
        stream_type: sound.stream_type(),
        channel: sound.channel(),
        incidental: sound.is_incidental(),
        enabled: activation == Activation::Enable,
        name: sound.name().to_string(),
        occlusion: sound.source_reverb().map(|s| s.current_softs().occlusion),
    }
}
