//! Rebuilding the site in a subprocess.
//!
//! The dev server never runs the pipeline in-process: a failing or crashing
//! build only fails that subprocess, and the server keeps serving whatever
//! output the last successful build left behind.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::server::ServerError;

/// The command that builds the site once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    /// Executable to run
    pub program: PathBuf,

    /// Arguments passed to it
    pub args: Vec<OsString>,
}

/// Outcome of one build subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The build exited successfully
    Succeeded { duration: Duration },

    /// The build exited with a failure status
    Failed {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// What the build reported
        message: String,
    },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl BuildCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run the build to completion, capturing its output.
    ///
    /// Only a failure to start the process is an error; a build that runs and
    /// fails is reported as [`BuildOutcome::Failed`].
    pub async fn run(&self) -> Result<BuildOutcome, ServerError> {
        let start = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ServerError::Spawn(format!("{}: {}", self.program.display(), e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stdout.lines() {
            tracing::debug!("build: {}", line);
        }

        if output.status.success() {
            return Ok(BuildOutcome::Succeeded {
                duration: start.elapsed(),
            });
        }

        for line in stderr.lines() {
            tracing::warn!("build: {}", line);
        }

        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        Ok(BuildOutcome::Failed {
            code: output.status.code(),
            message,
        })
    }
}
