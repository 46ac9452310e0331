//! External collaborators of a run
//!
//! The orchestrator only sequences these. Each trait has one process- or
//! filesystem-backed implementation used by the CLI; tests substitute mocks.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::common::{paths, Error, Result, ENV_DEBUG};
use crate::platform::Platform;

/// How long the bridge may take to accept connections
const BRIDGE_START_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the bridge gets to exit after SIGTERM before it is killed
const BRIDGE_STOP_GRACE: Duration = Duration::from_secs(2);

/// A running bridge process
#[async_trait]
pub trait BridgeHandle: Send {
    /// Terminate the process and wait for it
    async fn kill(&mut self) -> Result<()>;
}

/// Starts the bridge process
#[async_trait]
pub trait BridgeLauncher: Send + Sync {
    async fn start(&self, debug: bool) -> Result<Box<dyn BridgeHandle>>;
}

/// Runs the test suite to completion
#[async_trait]
pub trait TestEngine: Send + Sync {
    /// Run with the given extra environment; `Err` when the suite fails
    async fn run(&self, env: &[(&'static str, String)]) -> Result<()>;
}

/// Owns screenshots and reports of previous and current runs
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Remove the report and screenshots a previous run left behind
    async fn cleanup(&self) -> Result<()>;

    /// Write the report for `platform`
    async fn generate_report(&self, platform: Platform) -> Result<()>;
}

// === Bridge process ===

/// Spawns this binary's hidden `bridge` subcommand
pub struct ProcessBridgeLauncher {
    exe: PathBuf,
    port: u16,
}

impl ProcessBridgeLauncher {
    pub fn new(exe: PathBuf, port: u16) -> Self {
        Self { exe, port }
    }

    /// Launcher re-executing the current binary
    pub fn current_exe(port: u16) -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| {
            Error::BridgeStart(format!("Failed to get current executable path: {}", e))
        })?;
        Ok(Self::new(exe, port))
    }

    async fn wait_until_listening(&self, child: &mut Child) -> Result<()> {
        let addr = format!("127.0.0.1:{}", self.port);
        let deadline = Instant::now() + BRIDGE_START_TIMEOUT;

        loop {
            if let Some(status) = child.try_wait()? {
                return Err(Error::BridgeStart(format!(
                    "bridge exited during startup with {}",
                    status
                )));
            }

            if tokio::net::TcpStream::connect(addr.as_str()).await.is_ok() {
                tracing::debug!("Bridge accepting connections on {}", addr);
                return Ok(());
            }

            if Instant::now() >= deadline {
                let _ = child.kill().await;
                return Err(Error::BridgeStart(format!(
                    "timed out waiting for {} after {} seconds",
                    addr,
                    BRIDGE_START_TIMEOUT.as_secs()
                )));
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[async_trait]
impl BridgeLauncher for ProcessBridgeLauncher {
    async fn start(&self, debug: bool) -> Result<Box<dyn BridgeHandle>> {
        tracing::debug!("Spawning bridge process: {}", self.exe.display());

        let mut child = Command::new(&self.exe)
            .arg("bridge")
            .arg("--port")
            .arg(self.port.to_string())
            .env(ENV_DEBUG, debug.to_string())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::BridgeStart(format!("Failed to spawn bridge: {}", e)))?;

        self.wait_until_listening(&mut child).await?;

        Ok(Box::new(ProcessBridge { child }))
    }
}

struct ProcessBridge {
    child: Child,
}

#[async_trait]
impl BridgeHandle for ProcessBridge {
    async fn kill(&mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            tracing::debug!("Bridge already exited with {}", status);
            return Ok(());
        }

        // Ask nicely first so the bridge can close its peers
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // SAFETY: pid belongs to our own un-reaped child
                unsafe {
                    libc::kill(pid as i32, libc::SIGTERM);
                }
                let waited = tokio::time::timeout(BRIDGE_STOP_GRACE, self.child.wait()).await;
                if let Ok(status) = waited {
                    let status = status?;
                    tracing::debug!("Bridge exited with {}", status);
                    return Ok(());
                }
                tracing::warn!("Bridge ignored SIGTERM, killing it");
            }
        }

        self.child.kill().await?;
        Ok(())
    }
}

// === Test engine ===

/// Runs the configured test command through the shell
pub struct ShellTestEngine {
    command: String,
    cwd: PathBuf,
}

impl ShellTestEngine {
    pub fn new(command: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            command: command.into(),
            cwd,
        }
    }

    fn shell(&self) -> Command {
        #[cfg(unix)]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.command);
            cmd
        }
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.command);
            cmd
        }
    }
}

#[async_trait]
impl TestEngine for ShellTestEngine {
    async fn run(&self, env: &[(&'static str, String)]) -> Result<()> {
        tracing::debug!("Running test command: {}", self.command);
        for (key, value) in env {
            tracing::debug!("  {}={}", key, value);
        }

        let status = self
            .shell()
            .current_dir(&self.cwd)
            .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::TestExecutionFailure {
                code: status.code(),
            })
        }
    }
}

// === Artifacts ===

/// Screenshots and report under `<project>/.owl`
pub struct ArtifactDir {
    project_root: PathBuf,
}

/// Summary written to `report/index.json`
#[derive(Debug, Serialize)]
struct Report {
    platform: String,
    /// File names per screenshot kind (baseline, latest, diff)
    screenshots: BTreeMap<String, Vec<String>>,
    /// Screenshots that differ from their baseline
    failed: Vec<String>,
}

impl ArtifactDir {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    fn list_pngs(dir: &Path) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_png = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if is_png {
                if let Some(name) = path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ArtifactStore for ArtifactDir {
    async fn cleanup(&self) -> Result<()> {
        paths::remove_dir_if_exists(&paths::report_dir(&self.project_root))?;

        for platform in Platform::ALL {
            for kind in ["latest", "diff"] {
                let dir = paths::screenshot_dir(&self.project_root, platform, kind);
                paths::remove_dir_if_exists(&dir)?;
            }
        }

        tracing::debug!("Removed previous report and screenshots");
        Ok(())
    }

    async fn generate_report(&self, platform: Platform) -> Result<()> {
        let mut screenshots = BTreeMap::new();
        for kind in paths::SCREENSHOT_KINDS {
            let dir = paths::screenshot_dir(&self.project_root, platform, kind);
            screenshots.insert(kind.to_string(), Self::list_pngs(&dir)?);
        }
        let failed = screenshots.get("diff").cloned().unwrap_or_default();

        let report = Report {
            platform: platform.to_string(),
            screenshots,
            failed,
        };

        let dir = paths::report_dir(&self.project_root);
        std::fs::create_dir_all(&dir).map_err(|e| Error::Report(e.to_string()))?;
        let path = dir.join("index.json");
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).map_err(|e| Error::Report(e.to_string()))?;

        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"png").unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_keeps_baseline() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let baseline = paths::screenshot_dir(&root, Platform::Ios, "baseline").join("home.png");
        let latest = paths::screenshot_dir(&root, Platform::Ios, "latest").join("home.png");
        let report = paths::report_dir(&root).join("index.json");
        touch(&baseline);
        touch(&latest);
        touch(&report);

        ArtifactDir::new(root).cleanup().await.unwrap();

        assert!(baseline.exists());
        assert!(!latest.exists());
        assert!(!report.exists());
    }

    #[tokio::test]
    async fn test_cleanup_without_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ArtifactDir::new(tmp.path().to_path_buf())
            .cleanup()
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_generate_report_lists_screenshots() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        for kind in ["baseline", "latest"] {
            touch(&paths::screenshot_dir(&root, Platform::Android, kind).join("home.png"));
            touch(&paths::screenshot_dir(&root, Platform::Android, kind).join("list.png"));
        }
        touch(&paths::screenshot_dir(&root, Platform::Android, "diff").join("list.png"));
        touch(&paths::screenshot_dir(&root, Platform::Android, "diff").join("notes.txt"));

        ArtifactDir::new(root.clone())
            .generate_report(Platform::Android)
            .await
            .unwrap();

        let content = std::fs::read_to_string(paths::report_dir(&root).join("index.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(report["platform"], "android");
        assert_eq!(
            report["screenshots"]["baseline"],
            serde_json::json!(["home.png", "list.png"])
        );
        assert_eq!(report["failed"], serde_json::json!(["list.png"]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_engine_passes_env_and_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = ShellTestEngine::new(
            r#"test "$OWL_PLATFORM" = ios && touch ran"#,
            tmp.path().to_path_buf(),
        );
        engine
            .run(&[("OWL_PLATFORM", "ios".to_string())])
            .await
            .unwrap();
        assert!(tmp.path().join("ran").exists());

        let failing = ShellTestEngine::new("exit 3", tmp.path().to_path_buf());
        match failing.run(&[]).await {
            Err(Error::TestExecutionFailure { code }) => assert_eq!(code, Some(3)),
            other => panic!("Expected TestExecutionFailure, got {:?}", other),
        }
    }
}
