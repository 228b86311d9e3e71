//! Curve fitting.
//!
//! Responsibilities:
//! - exponential rate grid generation (`rate_grid`)
//! - per-slice fitting with model dispatch and sentinels (`fitter`)

pub mod fitter;
pub mod rate_grid;

pub use fitter::*;
