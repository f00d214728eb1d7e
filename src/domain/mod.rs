//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the study grid (`Target`, `SnrLevel`, `GridConfig`, `EffectKey`)
//! - the on-disk result archive (`EffectCache`)
//! - fit outputs (`QuadFit`, `SeriesFit`, `PeakMark`)
//! - the resolved run configuration (`StudyConfig`)

pub mod types;

pub use types::*;
