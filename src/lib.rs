//! owl - visual regression test runner for mobile apps
//!
//! Test code drives the app under test through the action protocol
//! ([`ActionClient`]); the `owl run` command orchestrates a full run around
//! it (bridge process, platform bootstrap, test suite, teardown, report).

pub mod bridge;
pub mod commands;
pub mod common;
pub mod platform;
pub mod protocol;
pub mod run;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use platform::Platform;
pub use protocol::{ActionClient, ScrollPosition};
