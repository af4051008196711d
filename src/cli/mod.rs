//! CLI module
//!
//! Provides command-line access to the schema engine:
//! - check: load a schema configuration and list its collections
//! - insert: validate one insert document read from stdin
//! - update: validate one update operator document read from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, insert, run, run_command, update};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, parse_document, read_document, success_response, write_error, write_response};
