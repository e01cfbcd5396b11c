//! CLI tool for weighted consistent hash rings.
//!
//! Provides commands for:
//! - Looking up the owner and replica set of keys
//! - Inspecting per-node ownership of the hash space
//! - Simulating key distribution and movement on join/leave

pub mod commands;
pub mod config;
pub mod simulation;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, NodeSpec};
pub use simulation::{run_simulation, SimulationParams, SimulationReport};
