// Subprocess execution with output capture, timeout handling, and
// structured failures. Retry policy belongs to callers, not this layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{ProcessError, Result};

/// Process execution configuration
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub environment: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl ProcessConfig {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            environment: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: Vec<impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn with_environment(mut self, env: HashMap<String, String>) -> Self {
        self.environment = env;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Command line rendered for error messages and logging.
    fn rendered(&self) -> String {
        let mut rendered = self.command.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Captured output of a successful run
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs to completion and maps outcomes onto the error
/// taxonomy: spawn failure, nonzero exit (or signal), timeout.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self, config: ProcessConfig) -> Result<ProcessOutput> {
        let rendered = config.rendered();

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out child must not linger once its future is dropped.
            .kill_on_drop(true);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.environment {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            command: rendered.clone(),
            error: e.to_string(),
        })?;

        let wait = child.wait_with_output();
        let output = match config.timeout {
            Some(limit) => match timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ProcessError::Timeout {
                        command: rendered,
                        duration: limit,
                    }
                    .into());
                }
            },
            None => wait.await,
        };

        let output = output.map_err(|e| ProcessError::OutputCaptureFailed {
            command: rendered.clone(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ProcessOutput { stdout, stderr })
        } else {
            Err(ProcessError::ExecutionFailed {
                command: config.command.display().to_string(),
                args: config.args,
                exit_code: output.status.code(),
                stderr,
            }
            .into())
        }
    }
}
