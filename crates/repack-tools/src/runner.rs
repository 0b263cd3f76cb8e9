//! Tool execution
//!
//! A delegated tool signals failure only through its exit status. Spawn
//! problems (tool not installed, not executable) are reported separately so
//! callers can tell "the tool said no" from "the tool never ran".

use std::io;
use std::process::Command;

use crate::Invocation;

/// Captured result of a finished tool process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A zero-exit output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A non-zero-exit output with the given stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Errors from running a delegated tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {}{}", display_code(.code), display_stderr(.stderr))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn display_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Executes delegated tool invocations, one at a time.
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion and capture its output.
    ///
    /// Returns `Err` only if the process could not be started.
    fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;

    /// Run the invocation and treat a non-zero exit as an error.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        let output = self.output(invocation)?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(ToolError::Failed {
                program: invocation.program_name(),
                code: output.code,
                stderr: output.stderr_trimmed().to_string(),
            })
        }
    }
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        tracing::debug!(command = %invocation, "running tool");

        let output = Command::new(invocation.program())
            .args(invocation.arguments())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program().display().to_string(),
                source,
            })?;

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(program = %invocation.program_name(), code = ?result.code, "tool finished");

        Ok(result)
    }
}
