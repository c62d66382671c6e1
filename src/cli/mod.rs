//! Command-line interface for metafill.
//!
//! This module provides CLI commands for resolving single tracks, querying
//! one catalog directly, backfilling a library and inspecting the config.

mod commands;

pub use commands::{Cli, Commands, run_command};
