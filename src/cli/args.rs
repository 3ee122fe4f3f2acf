//! CLI argument definitions using clap
//!
//! Commands:
//! - tenantql render --config <path>
//! - tenantql validate --config <path>
//! - tenantql check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tenantql - tenant-isolated analytical query engine
#[derive(Parser, Debug)]
#[command(name = "tenantql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the restricted statement for a request read from stdin (dry run)
    Render {
        /// Path to configuration file
        #[arg(long, default_value = "./tenantql.json")]
        config: PathBuf,
    },

    /// Validate a request read from stdin without rendering it
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./tenantql.json")]
        config: PathBuf,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./tenantql.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
