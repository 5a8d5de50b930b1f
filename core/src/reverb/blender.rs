//! Strength-weighted blending of reverb regions

use std::time::{Duration, Instant};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::properties::ReverbProperties;
use crate::backend::AudioBackend;

/// Minimum spacing of backend writes while blending several regions
pub const MORPH_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a reverb region owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey(pub u32);

impl std::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A scene volume that applies a reverb environment to the listener
pub trait ReverbRegion {
    /// How strongly the region applies at the listener, in `[0, 1]`
    fn strength(&self) -> f32;

    fn properties(&self) -> &ReverbProperties;

    fn name(&self) -> &str {
        ""
    }
}

/// Resolves region keys to live scene regions
pub trait RegionLookup {
    fn region(&self, key: RegionKey) -> Option<&dyn ReverbRegion>;
}

impl<R: ReverbRegion> RegionLookup for HashMap<RegionKey, R> {
    fn region(&self, key: RegionKey) -> Option<&dyn ReverbRegion> {
        self.get(&key).map(|r| r as &dyn ReverbRegion)
    }
}

/// State remembered between blends to skip redundant writes
#[derive(Debug, Clone)]
pub struct ReverbCache {
    last_mod_count: Option<usize>,
    last_was_empty: bool,
    /// Total strength when a single region was audible; -1 otherwise
    last_single_strength: f32,
    last_dominant: Option<RegionKey>,
    last_morph_write: Option<Instant>,
}

impl Default for ReverbCache {
    fn default() -> Self {
        Self {
            last_mod_count: None,
            last_was_empty: false,
            last_single_strength: -1.0,
            last_dominant: None,
            last_morph_write: None,
        }
    }
}

impl ReverbCache {
    /// Forget everything but the morph clock. Call whenever region
    /// membership changes.
    pub fn clear(&mut self) {
        *self = Self {
            last_morph_write: self.last_morph_write,
            ..Self::default()
        };
    }

    pub fn last_dominant(&self) -> Option<RegionKey> {
        self.last_dominant
    }

    pub fn last_single_strength(&self) -> f32 {
        self.last_single_strength
    }

    pub fn last_was_empty(&self) -> bool {
        self.last_was_empty
    }
}

/// Outcome of one blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReverbDecision {
    /// Same result as the last write
    Unchanged,
    /// Morphing, and the last morph write was too recent
    Throttled,
    Write(ReverbProperties),
}

impl ReverbDecision {
    pub fn properties(&self) -> Option<&ReverbProperties> {
        match self {
            Self::Write(props) => Some(props),
            _ => None,
        }
    }
}

/// Blend the regions, in order, into one parameter block.
///
/// Each region with positive strength is folded in with weight
/// `strength / (total + strength)` until the total reaches 1. A total
/// below 1 mutes the result proportionally. Unresolvable regions
/// contribute nothing.
pub fn blend<L>(cache: &mut ReverbCache, regions: &[RegionKey], lookup: &L, now: Instant) -> ReverbDecision
where
    L: RegionLookup + ?Sized,
{
    if cache.last_mod_count != Some(regions.len()) {
        tracing::trace!("Region count changed to {}, clearing reverb cache", regions.len());
        cache.clear();
        cache.last_mod_count = Some(regions.len());
    }

    if regions.is_empty() {
        if cache.last_was_empty {
            return ReverbDecision::Unchanged;
        }
        cache.last_was_empty = true;
        return ReverbDecision::Write(ReverbProperties::quiet());
    }

    let mut total = 0.0f32;
    let mut dominant = None;
    let mut accumulated: Option<ReverbProperties> = None;
    let mut morphing = false;

    for &key in regions {
        let Some(region) = lookup.region(key) else {
            continue;
        };
        let strength = region.strength();
        if !(strength > 0.0) {
            continue;
        }
        tracing::trace!("{:.2} - {} {}", strength, key, region.name());

        dominant = if total == 0.0 { Some(key) } else { None };
        accumulated = Some(match accumulated {
            None => *region.properties(),
            Some(props) => {
                morphing = true;
                props.interpolate(region.properties(), strength / (total + strength))
            }
        });
        total += strength;

        if total >= 1.0 {
            break;
        }
    }

    let Some(mut props) = accumulated else {
        if cache.last_was_empty {
            return ReverbDecision::Unchanged;
        }
        tracing::trace!("No audible regions, reverb goes quiet");
        cache.last_was_empty = true;
        cache.last_dominant = None;
        cache.last_single_strength = -1.0;
        return ReverbDecision::Write(ReverbProperties::quiet());
    };

    cache.last_was_empty = false;
    if dominant == cache.last_dominant && total == cache.last_single_strength {
        return ReverbDecision::Unchanged;
    }
    cache.last_dominant = dominant;
    cache.last_single_strength = if dominant.is_some() { total } else { -1.0 };

    if total < 1.0 {
        props.mute(total);
    }

    if morphing {
        if let Some(last) = cache.last_morph_write
            && now.saturating_duration_since(last) < MORPH_INTERVAL
        {
            return ReverbDecision::Throttled;
        }
        cache.last_morph_write = Some(now);
    }

    ReverbDecision::Write(props)
}

/// Owns the blend cache and pushes results to the backend
#[derive(Debug, Default)]
pub struct ReverbBlender {
    cache: ReverbCache,
    writes: u64,
    failures: u64,
}

impl ReverbBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ReverbCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Successful backend writes so far
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Blend and write the result. A failed write is logged and the cache
    /// keeps what the blend decided.
    pub fn process<B, L>(
        &mut self,
        backend: &mut B,
        regions: &[RegionKey],
        lookup: &L,
        now: Instant,
    ) -> ReverbDecision
    where
        B: AudioBackend + ?Sized,
        L: RegionLookup + ?Sized,
    {
        let decision = blend(&mut self.cache, regions, lookup, now);
        if let ReverbDecision::Write(props) = &decision {
            match backend.set_reverb_properties(props) {
                Ok(()) => self.writes += 1,
                Err(e) => {
                    self.failures += 1;
                    tracing::error!("Failed to apply reverb properties: {}", e);
                }
            }
        }
        decision
    }
}
