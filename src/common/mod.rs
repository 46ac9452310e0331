//! Common utilities shared between the runner and the bridge process

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod signal;

pub use error::{Error, Result};

/// Debug flag, `"true"` or `"false"`
pub const ENV_DEBUG: &str = "OWL_DEBUG";
/// Target platform identifier (`ios` / `android`)
pub const ENV_PLATFORM: &str = "OWL_PLATFORM";
/// Whether screenshots replace the baseline instead of being compared
pub const ENV_UPDATE_BASELINE: &str = "OWL_UPDATE_BASELINE";
/// Whether a report is generated after the run
pub const ENV_REPORT: &str = "OWL_REPORT";
/// Simulator the tests run against (iOS only)
pub const ENV_IOS_SIMULATOR: &str = "OWL_IOS_SIMULATOR";
/// `host:port` of the bridge process
pub const ENV_BRIDGE_ADDR: &str = "OWL_BRIDGE_ADDR";
