//! Command-line interface
//!
//! - render: print the restricted statement for a request
//! - validate: structural validation only
//! - check-config: load and validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, load_config, render, render_str, run, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
