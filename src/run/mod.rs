//! `owl run` - a complete test run against one platform
//!
//! Loads the configuration, then hands over to the [`Orchestrator`] which
//! starts the bridge, bootstraps the platform, runs the suite and always
//! tears down.

pub mod collaborators;
mod orchestrator;
mod phase;

pub use orchestrator::{test_env, Orchestrator, RunSettings};
pub use phase::RunPhase;

use std::path::PathBuf;

use crate::common::config::Config;
use crate::common::{logging, Result};
use crate::platform::Platform;

/// Options given on the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub platform: Platform,
    pub config_path: PathBuf,
    pub debug: bool,
    pub update: bool,
    pub report: bool,
}

/// Run the suite described by `options` from the current directory
pub async fn run(options: RunOptions) -> Result<()> {
    let mut config = Config::load(&options.config_path)?;
    config.validate(options.platform)?;

    // Command line flags can only switch these on
    config.debug |= options.debug;
    config.report |= options.report;

    logging::init_cli(config.debug);
    tracing::debug!("Using config at {}", options.config_path.display());

    let project_root = std::env::current_dir()?;
    tracing::debug!("Project root is {}", project_root.display());

    let settings = RunSettings {
        platform: options.platform,
        debug: config.debug,
        update: options.update,
        report: config.report,
    };

    let orchestrator = Orchestrator::for_project(&config, options.platform, project_root)?;
    orchestrator.run(&config, &settings).await
}
