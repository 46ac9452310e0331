//! CLI command definitions
//!
//! Defines the clap commands for the owl CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::config::DEFAULT_CONFIG_FILE;
use crate::platform::Platform;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the test suite on a simulator or emulator
    Run {
        /// Platform to run on
        #[arg(long, short, value_enum)]
        platform: Platform,

        /// Path to the configuration file
        #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Replace the baseline screenshots instead of comparing against them
        #[arg(long, short)]
        update: bool,

        /// Generate a report after the run
        #[arg(long)]
        report: bool,

        /// Verbose output from every phase
        #[arg(long)]
        debug: bool,
    },

    /// [Hidden] Run the message bridge - spawned automatically by `run`
    #[command(hide = true)]
    Bridge {
        /// Port to listen on
        #[arg(long, default_value_t = 8123)]
        port: u16,
    },
}
