//! Effect-size estimation for one (dataset, detrending setting) grid cell.
//!
//! Responsibilities:
//!
//! - deterministic synthetic observations per named dataset (`dataset`)
//! - SysRem detrending, parameterized by iteration count (`sysrem`)
//! - cross-correlation + Cohen's d between in/out-of-transit frames (`estimate`)
//!
//! The grid driver calls `cohen_d_for_dataset` once per cell and never looks
//! inside; everything in this module is deterministic for fixed inputs.

pub mod dataset;
pub mod estimate;
pub mod sysrem;

pub use dataset::*;
pub use estimate::*;
pub use sysrem::*;
