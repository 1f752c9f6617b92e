//! CLI module
//!
//! Command-line interface for the gateway.
//!
//! # Commands
//!
//! - `serve` - Mount one or all services and listen
//! - `check` - Validate the configuration and attach its databases
//! - `services` - List services and their mount points

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, ServiceSelection};
pub use runner::Runner;
