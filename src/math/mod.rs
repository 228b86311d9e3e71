//! Mathematical utilities: least squares and 1D minimization.

pub mod ols;
pub mod search;

pub use ols::*;
pub use search::*;
