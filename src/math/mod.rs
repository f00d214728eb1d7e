//! Mathematical utilities: least squares, polynomial fitting, effect-size statistics.

pub mod ols;
pub mod poly;
pub mod stats;

pub use ols::*;
pub use poly::*;
pub use stats::*;
