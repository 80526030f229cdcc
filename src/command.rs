//! External command execution
//!
//! Every system utility the analyzer reads goes through a [`CommandRunner`].
//! Runners never fail: a missing binary, a non-zero exit or a timeout is
//! reported in the returned [`CommandOutput`] so the caller can degrade the
//! affected fields to absent.

use crate::error::{AppError, ErrorContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Space-joined command line, used as the replay key
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Captured result of one command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub tool_absent: bool,
}

/// Coarse classification of a [`CommandOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failed,
    ToolAbsent,
    TimedOut,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            ..Default::default()
        }
    }

    pub fn absent() -> Self {
        Self {
            tool_absent: true,
            ..Default::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Default::default()
        }
    }

    pub fn status(&self) -> CommandStatus {
        if self.tool_absent {
            CommandStatus::ToolAbsent
        } else if self.timed_out {
            CommandStatus::TimedOut
        } else if self.exit_code == Some(0) {
            CommandStatus::Success
        } else {
            CommandStatus::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == CommandStatus::Success
    }

    /// Stdout when the command succeeded
    pub fn stdout_if_success(&self) -> Option<&str> {
        self.is_success().then_some(self.stdout.as_str())
    }

    /// Stdout whenever the tool ran to completion. `ping` exits non-zero on
    /// packet loss but still prints a usable summary.
    pub fn stdout_if_ran(&self) -> Option<&str> {
        match self.status() {
            CommandStatus::Success | CommandStatus::Failed => Some(self.stdout.as_str()),
            CommandStatus::ToolAbsent | CommandStatus::TimedOut => None,
        }
    }

    /// Map a non-successful status to the matching per-metric error
    pub fn to_error(&self, spec: &CommandSpec) -> Option<AppError> {
        match self.status() {
            CommandStatus::Success => None,
            CommandStatus::ToolAbsent => Some(AppError::tool_absent(spec.program.clone())),
            CommandStatus::TimedOut => Some(AppError::timeout(spec.command_line())),
            CommandStatus::Failed => Some(AppError::unreachable(format!(
                "{} exited with {:?}: {}",
                spec.command_line(),
                self.exit_code,
                self.stderr.trim()
            ))),
        }
    }
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec`, waiting at most `timeout`. Never errors.
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> CommandOutput;
}

/// Runs commands on the host with `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> CommandOutput {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                timed_out: false,
                tool_absent: false,
            },
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => CommandOutput::absent(),
            Ok(Err(e)) => CommandOutput {
                stderr: e.to_string(),
                ..Default::default()
            },
            // The child is killed when the output future is dropped
            Err(_elapsed) => CommandOutput::timeout(),
        }
    }
}

/// Serves captured outputs keyed by command line.
///
/// Commands without a capture are reported as absent tools.
#[derive(Debug, Default)]
pub struct ReplayRunner {
    outputs: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl ReplayRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the output for a command line such as `ifconfig en0`
    pub fn with(mut self, command_line: impl Into<String>, output: CommandOutput) -> Self {
        self.outputs.insert(command_line.into(), output);
        self
    }

    /// Register a successful command's stdout
    pub fn with_stdout(self, command_line: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.with(command_line, CommandOutput::success(stdout))
    }

    /// Load captures from a JSON object of command line to output
    pub fn from_json(json: &str) -> Result<Self> {
        let outputs: HashMap<String, CommandOutput> =
            serde_json::from_str(json).context("Invalid replay capture")?;
        Ok(Self {
            outputs,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::io(format!("Failed to read replay file {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Command lines requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for ReplayRunner {
    async fn run(&self, spec: &CommandSpec, _timeout: Duration) -> CommandOutput {
        let line = spec.command_line();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }
        self.outputs
            .get(&line)
            .cloned()
            .unwrap_or_else(CommandOutput::absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_rendering() {
        let spec = CommandSpec::new("netstat").args(["-I", "en0", "-b"]);
        assert_eq!(spec.command_line(), "netstat -I en0 -b");
        assert_eq!(spec.to_string(), "netstat -I en0 -b");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(CommandOutput::success("ok").status(), CommandStatus::Success);
        assert_eq!(CommandOutput::failed(2, "boom").status(), CommandStatus::Failed);
        assert_eq!(CommandOutput::absent().status(), CommandStatus::ToolAbsent);
        assert_eq!(CommandOutput::timeout().status(), CommandStatus::TimedOut);
    }

    #[test]
    fn test_stdout_accessors() {
        let failed = CommandOutput {
            stdout: "10 packets transmitted, 0 packets received".into(),
            exit_code: Some(2),
            ..Default::default()
        };
        assert_eq!(failed.stdout_if_success(), None);
        assert!(failed.stdout_if_ran().is_some());
        assert_eq!(CommandOutput::timeout().stdout_if_ran(), None);
    }

    #[test]
    fn test_error_mapping() {
        let spec = CommandSpec::new("airport").arg("-I");
        assert!(CommandOutput::success("").to_error(&spec).is_none());
        assert_eq!(
            CommandOutput::absent().to_error(&spec).unwrap().category(),
            "TOOL"
        );
        assert_eq!(
            CommandOutput::timeout().to_error(&spec).unwrap().category(),
            "TIMEOUT"
        );
    }

    #[tokio::test]
    async fn test_replay_runner_serves_captures() {
        let runner = ReplayRunner::new().with_stdout("ifconfig en0", "en0: flags=8863<UP>");
        let spec = CommandSpec::new("ifconfig").arg("en0");

        let output = runner.run(&spec, Duration::from_secs(1)).await;
        assert!(output.is_success());
        assert!(output.stdout.starts_with("en0:"));

        let missing = runner
            .run(&CommandSpec::new("airport").arg("-I"), Duration::from_secs(1))
            .await;
        assert_eq!(missing.status(), CommandStatus::ToolAbsent);

        assert_eq!(runner.calls(), vec!["ifconfig en0", "airport -I"]);
        assert!(runner.was_called("airport"));
    }

    #[test]
    fn test_replay_runner_from_json() {
        let json = r#"{
            "ifconfig en0": {"stdout": "en0: flags=8863<UP>", "exit_code": 0},
            "networkQuality -I en0 -v": {"timed_out": true}
        }"#;
        let runner = ReplayRunner::from_json(json).unwrap();
        assert_eq!(runner.outputs.len(), 2);
        assert_eq!(
            runner.outputs["networkQuality -I en0 -v"].status(),
            CommandStatus::TimedOut
        );
        assert!(ReplayRunner::from_json("[1, 2]").is_err());
    }

    #[tokio::test]
    async fn test_system_runner_reports_missing_tool() {
        let spec = CommandSpec::new("definitely-not-a-real-tool-7f3a");
        let output = SystemRunner::new().run(&spec, Duration::from_secs(5)).await;
        assert_eq!(output.status(), CommandStatus::ToolAbsent);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_times_out() {
        let spec = CommandSpec::new("sleep").arg("5");
        let output = SystemRunner::new().run(&spec, Duration::from_millis(100)).await;
        assert_eq!(output.status(), CommandStatus::TimedOut);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_keeps_nonzero_exit() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner::new().run(&spec, Duration::from_secs(5)).await;
        assert_eq!(output.status(), CommandStatus::Failed);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
