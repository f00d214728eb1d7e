//! Input/output helpers.
//!
//! - result archive read/write with build-on-miss (`cache`)
//! - result exports (CSV/JSON) (`export`)

pub mod cache;
pub mod export;

pub use cache::*;
pub use export::*;
