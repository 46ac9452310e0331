//! Platform bootstrap and restore
//!
//! Before tests run, the simulator or emulator is put into a fixed visual
//! state (clock, network and battery indicators, theme) and the app is
//! installed and launched. Afterwards the system UI is restored.

mod android;
mod ios;
mod shell;

pub use android::AndroidBootstrapper;
pub use ios::IosBootstrapper;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::common::config::Config;
use crate::common::{Error, Result};

/// Supported target platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// All platforms, in a stable order
    pub const ALL: [Platform; 2] = [Platform::Ios, Platform::Android];

    /// Identifier used on the command line and in the environment
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(Error::Config(format!("Unknown platform '{}'", other))),
        }
    }
}

/// Brings a platform into a known state and back
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    /// Platform this bootstrapper drives
    fn platform(&self) -> Platform;

    /// Install and launch the app on a deterministic system UI
    async fn bootstrap(&self, config: &Config) -> Result<()>;

    /// Undo the system UI overrides made by [`Bootstrapper::bootstrap`]
    async fn restore(&self, config: &Config) -> Result<()>;
}

/// Bootstrapper for `platform` working from `project_root`
pub fn bootstrapper_for(platform: Platform, project_root: PathBuf) -> Box<dyn Bootstrapper> {
    match platform {
        Platform::Ios => Box::new(IosBootstrapper::new(project_root)),
        Platform::Android => Box::new(AndroidBootstrapper::new(project_root)),
    }
}
