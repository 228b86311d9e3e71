//! `sevare-curves` library crate.
//!
//! The binary (`sevare-parse`) is a thin wrapper around this library so that:
//!
//! - the parse pipeline is testable without spawning processes
//! - slicing, fitting and ranking can be reused by other tooling

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod slice;
