//! External command steps used by the bootstrappers

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// One external command with its arguments
pub(crate) struct Step<'a> {
    program: &'a str,
    args: Vec<&'a str>,
    cwd: Option<&'a Path>,
}

impl<'a> Step<'a> {
    pub(crate) fn new(program: &'a str, args: &[&'a str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
            cwd: None,
        }
    }

    pub(crate) fn cwd(mut self, cwd: &'a Path) -> Self {
        self.cwd = Some(cwd);
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn describe(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, output shown only in debug mode
    pub(crate) async fn run(&self, debug: bool) -> io::Result<()> {
        tracing::debug!("$ {}", self.describe());

        let stdio = || {
            if debug {
                Stdio::inherit()
            } else {
                Stdio::null()
            }
        };

        let status = self
            .command()
            .stdout(stdio())
            .stderr(stdio())
            .status()
            .await?;

        if !status.success() {
            return Err(io::Error::other(format!(
                "`{}` exited with {}",
                self.describe(),
                status
            )));
        }
        Ok(())
    }

    /// Run to completion and return trimmed stdout
    pub(crate) async fn capture(&self) -> io::Result<String> {
        tracing::debug!("$ {}", self.describe());

        let output = self
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "`{}` exited with {}: {}",
                self.describe(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Fail unless `tool` is on PATH
pub(crate) fn require_tool(tool: &str) -> io::Result<()> {
    which::which(tool)
        .map(|_| ())
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, format!("'{}' not found in PATH", tool)))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_trims_stdout() {
        let out = Step::new("echo", &["  hello  "]).capture().await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let err = Step::new("false", &[]).run(false).await.unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[tokio::test]
    async fn test_cwd_is_applied() {
        let tmp = tempfile::tempdir().unwrap();
        let out = Step::new("pwd", &[]).cwd(tmp.path()).capture().await.unwrap();
        let expected = tmp.path().canonicalize().unwrap();
        assert_eq!(Path::new(&out).canonicalize().unwrap(), expected);
    }

    #[test]
    fn test_missing_tool() {
        assert!(require_tool("definitely-not-a-real-tool-owl").is_err());
    }
}
