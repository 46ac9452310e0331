//! Error types for the owl test runner
//!
//! Action errors are what test code sees when an interaction with the app
//! under test fails. Run errors surface from the orchestrator and decide
//! the process exit code.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the owl runner
#[derive(Error, Debug)]
pub enum Error {
    // === Action Outcome Errors ===
    #[error("No element with testID '{test_id}' was found in the app")]
    TargetNotFound { test_id: String },

    #[error("The app failed to perform the action on testID '{test_id}'")]
    ActionFailed { test_id: String },

    #[error("Unrecognized action outcome type '{0}'")]
    UnrecognizedOutcome(String),

    #[error("Malformed action outcome: {0}")]
    MalformedOutcome(String),

    #[error("No outcome received for testID '{test_id}' within {millis} ms")]
    ActionTimeout { test_id: String, millis: u128 },

    #[error("Invalid scroll position: {0}")]
    InvalidScrollPosition(String),

    // === Channel Errors ===
    #[error("Message channel error: {0}")]
    Channel(String),

    #[error("Message channel closed before an outcome was received")]
    ChannelClosed,

    // === Run Errors ===
    #[error("Failed to start bridge process: {0}")]
    BridgeStart(String),

    #[error("Failed to bootstrap {platform}: {reason}")]
    BootstrapFailure { platform: String, reason: String },

    #[error("Failed to restore {platform}: {reason}")]
    RestoreFailure { platform: String, reason: String },

    #[error("Test run failed{}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    TestExecutionFailure { code: Option<i32> },

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Run interrupted by {0}")]
    Interrupted(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a target not found error
    pub fn target_not_found(test_id: &str) -> Self {
        Self::TargetNotFound {
            test_id: test_id.to_string(),
        }
    }

    /// Create an action failed error
    pub fn action_failed(test_id: &str) -> Self {
        Self::ActionFailed {
            test_id: test_id.to_string(),
        }
    }

    /// Create a bootstrap failure for a platform
    pub fn bootstrap(platform: impl ToString, reason: impl Into<String>) -> Self {
        Self::BootstrapFailure {
            platform: platform.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a restore failure for a platform
    pub fn restore(platform: impl ToString, reason: impl Into<String>) -> Self {
        Self::RestoreFailure {
            platform: platform.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_message() {
        let err = Error::TestExecutionFailure { code: Some(1) };
        assert_eq!(err.to_string(), "Test run failed with exit code 1");

        let err = Error::TestExecutionFailure { code: None };
        assert_eq!(err.to_string(), "Test run failed");
    }

    #[test]
    fn test_interrupted_message_names_signal() {
        let err = Error::Interrupted("SIGTERM".to_string());
        assert_eq!(err.to_string(), "Run interrupted by SIGTERM");
    }
}
