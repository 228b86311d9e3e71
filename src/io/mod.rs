//! Input/output helpers.
//!
//! - result table discovery, ingest and column roles (`ingest`)
//! - slice files, separators and report writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
