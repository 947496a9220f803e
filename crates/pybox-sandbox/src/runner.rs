//! Snippet runner: temp-file artifact, child process, bounded wait

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{Result, SandboxError};

/// Configuration for the sandbox
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum wall-clock execution time
    pub timeout: Duration,
    /// Interpreter used to run snippets
    pub python: String,
    /// Directory for execution artifacts; system temp dir when unset
    pub workdir: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            python: "python3".to_string(),
            workdir: None,
        }
    }
}

/// Captured output of one run.
///
/// Both fields are always present. A non-zero exit, a timeout, or an internal
/// failure all land in `stderr` as text; nothing propagates as a fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes analyzer-approved snippets, one process per call.
///
/// Each run owns exactly one artifact file and at most one child process;
/// both are gone by the time `run` returns, on every path.
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run a snippet and capture its output.
    ///
    /// Never returns an error: internal failures (interpreter missing, OS
    /// resource exhaustion) become descriptive `stderr` text, matching the
    /// shape of a snippet that ran and printed its own error.
    pub async fn run(&self, source: &str) -> RunOutput {
        match self.run_staged(source).await {
            Ok(output) => output,
            Err(e) => RunOutput {
                stdout: String::new(),
                stderr: format!("Server-side execution error: {}", e),
            },
        }
    }

    async fn run_staged(&self, source: &str) -> Result<RunOutput> {
        let artifact = self.stage(source)?;
        let outcome = self.spawn_and_wait(artifact.path()).await;

        // Unconditional cleanup: the deferred delete runs before the outcome
        // is surfaced, and a failed delete never changes the response
        if let Err(e) = artifact.close() {
            warn!(error = %e, "failed to delete execution artifact");
        }

        outcome
    }

    /// Write the snippet verbatim to a collision-free temp file
    fn stage(&self, source: &str) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pybox-").suffix(".py");

        let mut artifact = match &self.config.workdir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(SandboxError::Stage)?;

        artifact
            .write_all(source.as_bytes())
            .and_then(|_| artifact.flush())
            .map_err(SandboxError::Stage)?;

        Ok(artifact)
    }

    async fn spawn_and_wait(&self, artifact: &std::path::Path) -> Result<RunOutput> {
        debug!(
            artifact = %artifact.display(),
            python = %self.config.python,
            "spawning interpreter"
        );

        // -I: isolated mode (no site customization, no user site-packages)
        // -u: unbuffered, so output survives a mid-stream kill
        let child = Command::new(&self.config.python)
            .arg("-u")
            .arg("-I")
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn {
                python: self.config.python.clone(),
                source: e,
            })?;

        match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(RunOutput {
                // Lossy decode: undecodable bytes are replaced, never a fault
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(SandboxError::Wait(e)),
            // Deadline hit: dropping the wait future drops the child, and
            // kill_on_drop delivers the forceful terminate. No negotiation.
            Err(_elapsed) => {
                warn!(timeout = ?self.config.timeout, "snippet exceeded deadline, killed");
                Ok(RunOutput {
                    stdout: String::new(),
                    stderr: format!(
                        "Error: code ran longer than {:?} and was terminated.",
                        self.config.timeout
                    ),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sandbox_with(timeout: Duration, workdir: Option<PathBuf>) -> Sandbox {
        Sandbox::new(SandboxConfig {
            timeout,
            workdir,
            ..SandboxConfig::default()
        })
    }

    #[tokio::test]
    async fn round_trip_print() {
        let sandbox = Sandbox::new(SandboxConfig::default());
        let out = sandbox.run("print('hi')").await;
        assert_eq!(out.stdout, "hi\n");
        assert_eq!(out.stderr, "");
    }

    #[tokio::test]
    async fn runtime_error_lands_in_stderr() {
        let sandbox = Sandbox::new(SandboxConfig::default());
        let out = sandbox.run("print(1 / 0)").await;
        assert_eq!(out.stdout, "");
        assert!(out.stderr.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_a_fault() {
        let sandbox = Sandbox::new(SandboxConfig::default());
        let out = sandbox.run("raise SystemExit('boom')").await;
        assert!(out.stderr.contains("boom"));
    }

    #[tokio::test]
    async fn infinite_loop_is_killed_at_the_deadline() {
        let sandbox = sandbox_with(Duration::from_millis(500), None);
        let started = Instant::now();
        let out = sandbox.run("while True:\n    pass\n").await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(out.stdout, "");
        assert!(out.stderr.contains("terminated"));
    }

    #[tokio::test]
    async fn artifact_is_deleted_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_with(Duration::from_secs(5), Some(dir.path().to_path_buf()));
        sandbox.run("print('x')").await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn artifact_is_deleted_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_with(Duration::from_millis(300), Some(dir.path().to_path_buf()));
        sandbox.run("while True:\n    pass\n").await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn artifact_is_deleted_when_spawn_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(SandboxConfig {
            python: "pybox-no-such-interpreter".to_string(),
            workdir: Some(dir.path().to_path_buf()),
            ..SandboxConfig::default()
        });
        let out = sandbox.run("print('x')").await;
        assert!(out.stderr.contains("Server-side execution error"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn isolated_mode_still_has_the_stdlib() {
        // `-I` strips site and user customization, not the interpreter
        let sandbox = Sandbox::new(SandboxConfig::default());
        let out = sandbox.run("import math\nprint(math.floor(2.7))").await;
        assert_eq!(out.stdout, "2\n");
        assert_eq!(out.stderr, "");
    }

    #[tokio::test]
    async fn concurrent_runs_do_not_mix_output() {
        let sandbox = Sandbox::new(SandboxConfig::default());
        let (a, b) = tokio::join!(sandbox.run("print('alpha')"), sandbox.run("print('beta')"));
        assert_eq!(a.stdout, "alpha\n");
        assert_eq!(b.stdout, "beta\n");
        assert_eq!(a.stderr, "");
        assert_eq!(b.stderr, "");
    }
}
