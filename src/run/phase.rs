//! Run lifecycle phases

use std::fmt;

/// Stage of a run, entered strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Init,
    ArtifactCleanup,
    BridgeStarting,
    PlatformBootstrap,
    TestExecution,
    Teardown,
    Reporting,
    Done,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Init => "INIT",
            RunPhase::ArtifactCleanup => "ARTIFACT_CLEANUP",
            RunPhase::BridgeStarting => "BRIDGE_STARTING",
            RunPhase::PlatformBootstrap => "PLATFORM_BOOTSTRAP",
            RunPhase::TestExecution => "TEST_EXECUTION",
            RunPhase::Teardown => "TEARDOWN",
            RunPhase::Reporting => "REPORTING",
            RunPhase::Done => "DONE",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(RunPhase::Init < RunPhase::ArtifactCleanup);
        assert!(RunPhase::TestExecution < RunPhase::Teardown);
        assert!(RunPhase::Teardown < RunPhase::Reporting);
        assert!(RunPhase::Reporting < RunPhase::Done);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RunPhase::PlatformBootstrap.to_string(), "PLATFORM_BOOTSTRAP");
        assert_eq!(RunPhase::Done.as_str(), "DONE");
    }
}
