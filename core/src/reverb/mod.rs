//! Environmental reverb
//!
//! Reverb regions are blended by strength into a single EAX reverb block
//! each update. A [`ReverbCache`] skips writes when nothing changed, and
//! writes while morphing between regions are limited to one per
//! [`MORPH_INTERVAL`].

mod blender;
mod properties;
mod source;


pub use blender::{
    MORPH_INTERVAL, RegionKey, RegionLookup, ReverbBlender, ReverbCache, ReverbDecision, ReverbRegion, blend,
};
pub use properties::{
    MAX_LATE_REVERB_DELAY, MAX_REFLECTIONS_DELAY, REVERB_MIN_GAIN, ReverbPreset, ReverbProperties,
};
pub use source::{OcclusionSoftValues, SourceParams, SourceReverbSettings};
