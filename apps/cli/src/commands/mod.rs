//! Command implementations for the Cadence CLI.

pub mod checkpoint;
pub mod config;
pub mod prune;
