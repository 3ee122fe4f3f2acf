//! tenantql CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`, which also writes the
//! response envelope. Errors are echoed to stderr with a non-zero exit.

use tenantql::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
