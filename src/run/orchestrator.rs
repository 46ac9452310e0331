//! Run orchestrator - the phase machine behind `owl run`
//!
//! Phases run strictly in order. Once the bridge has been started, every
//! exit path goes through teardown: the bridge is terminated and the platform
//! restored exactly once each, then the report is generated if requested.
//! Teardown steps only log their own failures; the first failure of the run
//! is what [`Orchestrator::run`] returns. SIGINT or SIGTERM during a run counts
//! as that failure and still goes through teardown.

use std::future::Future;
use std::path::PathBuf;

use crate::common::config::Config;
use crate::common::signal::shutdown_signal;
use crate::common::{
    Error, Result, ENV_BRIDGE_ADDR, ENV_DEBUG, ENV_IOS_SIMULATOR, ENV_PLATFORM, ENV_REPORT,
    ENV_UPDATE_BASELINE,
};
use crate::platform::{self, Bootstrapper, Platform};

use super::collaborators::{
    ArtifactDir, ArtifactStore, BridgeHandle, BridgeLauncher, ProcessBridgeLauncher,
    ShellTestEngine, TestEngine,
};
use super::phase::RunPhase;

/// Flags of a single run
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub platform: Platform,
    pub debug: bool,
    /// Replace baseline screenshots instead of comparing against them
    pub update: bool,
    /// Generate a report after teardown
    pub report: bool,
}

/// State threaded through the phases of one run
struct RunContext {
    phase: RunPhase,
    errored: bool,
    bridge: Option<Box<dyn BridgeHandle>>,
    /// Bootstrap was attempted, so the platform may need restoring
    platform_touched: bool,
}

impl RunContext {
    fn new() -> Self {
        Self {
            phase: RunPhase::Init,
            errored: false,
            bridge: None,
            platform_touched: false,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug_assert!(phase >= self.phase, "run phases only move forward");
        tracing::debug!(from = %self.phase, to = %phase, errored = self.errored, "Run phase");
        self.phase = phase;
    }
}

/// Sequences a run over its collaborators
pub struct Orchestrator {
    artifacts: Box<dyn ArtifactStore>,
    bridge: Box<dyn BridgeLauncher>,
    platform: Box<dyn Bootstrapper>,
    engine: Box<dyn TestEngine>,
}

impl Orchestrator {
    pub fn new(
        artifacts: Box<dyn ArtifactStore>,
        bridge: Box<dyn BridgeLauncher>,
        platform: Box<dyn Bootstrapper>,
        engine: Box<dyn TestEngine>,
    ) -> Self {
        Self {
            artifacts,
            bridge,
            platform,
            engine,
        }
    }

    /// Orchestrator wired to real processes for a project checkout
    pub fn for_project(config: &Config, platform: Platform, project_root: PathBuf) -> Result<Self> {
        Ok(Self::new(
            Box::new(ArtifactDir::new(project_root.clone())),
            Box::new(ProcessBridgeLauncher::current_exe(config.bridge.port)?),
            platform::bootstrapper_for(platform, project_root.clone()),
            Box::new(ShellTestEngine::new(config.tests.command.clone(), project_root)),
        ))
    }

    /// Execute every phase of a run
    ///
    /// Returns the first failure from cleanup, bridge start, bootstrap or the
    /// test suite, after teardown has run.
    pub async fn run(&self, config: &Config, settings: &RunSettings) -> Result<()> {
        self.run_until(config, settings, shutdown_signal()).await
    }

    /// Like [`Orchestrator::run`], but stops acquiring and testing as soon as
    /// `interrupt` resolves, with the name it resolves to as the failure
    pub async fn run_until<I>(
        &self,
        config: &Config,
        settings: &RunSettings,
        interrupt: I,
    ) -> Result<()>
    where
        I: Future<Output = &'static str>,
    {
        let mut ctx = RunContext::new();

        // Nothing is held yet, so a cleanup failure simply aborts
        ctx.enter(RunPhase::ArtifactCleanup);
        self.artifacts.cleanup().await?;

        let primary = tokio::select! {
            result = self.execute(&mut ctx, config, settings) => result,
            signal = interrupt => Err(Error::Interrupted(signal.to_string())),
        };
        if let Err(e) = &primary {
            ctx.errored = true;
            tracing::error!(phase = %ctx.phase, "Run failed: {}", e);
        }

        self.teardown(&mut ctx, config).await;
        self.report(&mut ctx, settings).await;

        ctx.enter(RunPhase::Done);
        if ctx.errored {
            tracing::info!("Tests finished on {} with errors", settings.platform);
        } else {
            tracing::info!("Tests completed on {}", settings.platform);
        }
        if !ctx.errored && settings.update {
            tracing::info!(
                "All baseline images for {} have been updated successfully",
                settings.platform
            );
        }

        primary
    }

    /// Acquire the bridge and platform, then run the suite
    async fn execute(
        &self,
        ctx: &mut RunContext,
        config: &Config,
        settings: &RunSettings,
    ) -> Result<()> {
        ctx.enter(RunPhase::BridgeStarting);
        tracing::info!("Starting bridge on {}", config.bridge.address());
        ctx.bridge = Some(self.bridge.start(settings.debug).await?);

        ctx.enter(RunPhase::PlatformBootstrap);
        tracing::info!("Running tests on {}", settings.platform);
        ctx.platform_touched = true;
        self.platform.bootstrap(config).await?;

        ctx.enter(RunPhase::TestExecution);
        if settings.update {
            tracing::info!("(Update mode) Updating baseline images");
        } else {
            tracing::info!("(Tests mode) Will compare latest images with the baseline");
        }
        self.engine.run(&test_env(config, settings)).await
    }

    /// Release whatever was acquired; failures are logged only
    async fn teardown(&self, ctx: &mut RunContext, config: &Config) {
        ctx.enter(RunPhase::Teardown);

        if let Some(mut bridge) = ctx.bridge.take() {
            if let Err(e) = bridge.kill().await {
                tracing::warn!("Failed to stop bridge: {}", e);
            }
        }

        if ctx.platform_touched {
            if let Err(e) = self.platform.restore(config).await {
                tracing::warn!("{}", e);
            }
        }
    }

    async fn report(&self, ctx: &mut RunContext, settings: &RunSettings) {
        ctx.enter(RunPhase::Reporting);

        if !settings.report {
            return;
        }
        if let Err(e) = self.artifacts.generate_report(settings.platform).await {
            tracing::warn!("{}", e);
        }
    }
}

/// Environment handed to the test suite
pub fn test_env(config: &Config, settings: &RunSettings) -> Vec<(&'static str, String)> {
    let mut env = vec![
        (ENV_PLATFORM, settings.platform.to_string()),
        (ENV_DEBUG, settings.debug.to_string()),
        (ENV_UPDATE_BASELINE, settings.update.to_string()),
        (ENV_REPORT, settings.report.to_string()),
        (ENV_BRIDGE_ADDR, config.bridge.address()),
    ];
    if let Some(device) = config.device_id(settings.platform) {
        env.push((ENV_IOS_SIMULATOR, device.to_string()));
    }
    env
}
