//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tracked-variable registry and 3D variable pairs (`TrackedVariable`, `VARIABLE_PAIRS`)
//! - the protocol security classification (`SecurityClass`)
//! - run configuration (`ParseConfig`, `OutputMode`)
//! - fit outputs (`FitOutcome`, `SliceFit`)

pub mod security;
pub mod types;

pub use security::*;
pub use types::*;
