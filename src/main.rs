//! owl - visual regression test runner for mobile apps
//!
//! Starts a message bridge, puts a simulator or emulator into a fixed state,
//! runs the test suite against the app, and cleans up afterwards.

use clap::Parser;
use colored::Colorize;
use commands::Commands;
use owl::{bridge, commands, common::logging, run};

#[derive(Parser)]
#[command(name = "owl", about = "Visual regression testing for mobile apps")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            platform,
            config,
            update,
            report,
            debug,
        } => {
            run::run(run::RunOptions {
                platform,
                config_path: config,
                debug,
                update,
                report,
            })
            .await
        }
        Commands::Bridge { port } => {
            logging::init_bridge();
            bridge::run(port).await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
