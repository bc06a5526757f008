//! CLI module for abform
//!
//! Provides command-line interface for:
//! - init: Write a default config file
//! - start: Serve the experiment API
//! - simulate: Check the router's split offline

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, simulate, start, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
