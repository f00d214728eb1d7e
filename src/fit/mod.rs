//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - per-setting quadratic fits over the effect-size series (`quad`)
//! - dense evaluation and fitted-maximum location

pub mod quad;

pub use quad::*;
