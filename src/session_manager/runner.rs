//! Remote Command Runner
//!
//! Runs one command per exec channel and turns the raw streams into a
//! `CommandResult`.
//!
//! # Invariants
//! - One channel per call, closed on every exit path (including deadline expiry)
//! - Stdout is consumed before stderr lines are processed or logged
//! - At most `MAX_DIAGNOSTIC_LINES` stderr lines are buffered; the rest are drained
//! - Buffered stderr is logged on every exit path, including timeouts
//! - Exit status 127 maps to `ServerNotInstalled`, any other non-zero to `RemoteCommandFailed`

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use super::commands::ServerCommands;
use super::error::{Result, SessionManagerError};
use super::transport::{ExecChannel, ExecEvent, ExecTransport};
use crate::ssh::SshError;

/// Maximum number of buffered stderr lines per command
pub const MAX_DIAGNOSTIC_LINES: usize = 20;

/// Longest stderr line kept; the remainder of the line is discarded
const MAX_DIAGNOSTIC_LINE_BYTES: usize = 8192;

/// Stdout bytes kept per command
const MAX_STDOUT_BYTES: usize = 64 * 1024;

/// Shell exit status for "command not found"
pub const EXIT_COMMAND_NOT_FOUND: u32 = 127;

const DIAGNOSTIC_RULE: &str =
    "===============================================================================";
const DIAGNOSTIC_HEADER: &str = "SERVER WARNINGS/NOTIFICATIONS:";

/// A command line bound to the host it runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInvocation {
    pub command: String,
    pub host: String,
}

/// Captured output of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// `None` when the server never sent an exit status
    pub exit_status: Option<u32>,
    pub exit_signal: Option<String>,
    pub stdout: Vec<String>,
    /// First `MAX_DIAGNOSTIC_LINES` stderr lines
    pub stderr: Vec<String>,
    /// First non-blank line of stdout, else of stderr
    pub first_error_line: Option<String>,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Runs server commands against one host over one transport
pub struct RemoteRunner<'a> {
    transport: &'a dyn ExecTransport,
    host: String,
    commands: ServerCommands,
    deadline: Option<Duration>,
}

impl<'a> RemoteRunner<'a> {
    pub fn new(
        transport: &'a dyn ExecTransport,
        host: impl Into<String>,
        commands: ServerCommands,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            host: host.into(),
            commands,
            deadline,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn commands(&self) -> &ServerCommands {
        &self.commands
    }

    /// Run `command`, log its diagnostics and classify its exit status
    pub async fn run(&self, command: String) -> Result<CommandResult> {
        self.run_logged(command, DiagnosticEcho::Plain).await
    }

    /// Like `run`, but logged diagnostic lines have everything after the
    /// last `:` masked. For commands that report a secret on stderr.
    pub async fn run_masked(&self, command: String) -> Result<CommandResult> {
        self.run_logged(command, DiagnosticEcho::Masked).await
    }

    async fn run_logged(&self, command: String, echo: DiagnosticEcho) -> Result<CommandResult> {
        let invocation = RemoteInvocation {
            command,
            host: self.host.clone(),
        };
        let result = self.capture(&invocation, echo).await?;
        self.check(invocation, result)
    }

    async fn capture(
        &self,
        invocation: &RemoteInvocation,
        echo: DiagnosticEcho,
    ) -> Result<CommandResult> {
        let execution_error = |source: SshError| SessionManagerError::Execution {
            command: invocation.command.clone(),
            host: invocation.host.clone(),
            source,
        };

        let mut channel = self
            .transport
            .open_exec(&invocation.command)
            .await
            .map_err(execution_error)?;

        let mut diagnostics = DiagnosticCapture::default();
        let drained = match self.deadline {
            Some(deadline) => timeout(deadline, drain_channel(channel.as_mut(), &mut diagnostics))
                .await
                .unwrap_or_else(|_| {
                    Err(SshError::Timeout(format!("no result after {:?}", deadline)))
                }),
            None => drain_channel(channel.as_mut(), &mut diagnostics).await,
        };

        if let Err(e) = channel.close().await {
            debug!("Exec channel close error (non-fatal): {}", e);
        }

        // Logged on every path so a failed or hung command keeps its warnings
        let stderr = diagnostics.finish();
        let logged = match echo {
            DiagnosticEcho::Plain => diagnostic_log_lines(&stderr),
            DiagnosticEcho::Masked => {
                let masked: Vec<String> = stderr.iter().map(|line| mask_secret(line)).collect();
                diagnostic_log_lines(&masked)
            }
        };
        for line in logged {
            debug!("{}", line);
        }

        let mut result = drained.map_err(execution_error)?;
        result.first_error_line = result
            .stdout
            .iter()
            .chain(stderr.iter())
            .find(|line| !line.trim().is_empty())
            .cloned();
        result.stderr = stderr;
        Ok(result)
    }

    fn check(&self, invocation: RemoteInvocation, result: CommandResult) -> Result<CommandResult> {
        match result.exit_status {
            Some(0) => Ok(result),
            Some(EXIT_COMMAND_NOT_FOUND) => Err(SessionManagerError::ServerNotInstalled {
                command: invocation.command,
                host: invocation.host,
                server_dir: self.commands.server_dir().to_string(),
            }),
            exit_status => {
                let detail = result.first_error_line.clone().or_else(|| {
                    result
                        .exit_signal
                        .as_ref()
                        .map(|signal| format!("terminated by signal {}", signal))
                });
                Err(SessionManagerError::RemoteCommandFailed {
                    command: invocation.command,
                    host: invocation.host,
                    exit_status,
                    detail,
                })
            }
        }
    }
}

/// Read every event until the channel closes. Stderr goes to `diagnostics`,
/// which survives a timeout or transport error.
async fn drain_channel(
    channel: &mut dyn ExecChannel,
    diagnostics: &mut DiagnosticCapture,
) -> std::result::Result<CommandResult, SshError> {
    let mut stdout = Vec::new();
    let mut exit_status = None;
    let mut exit_signal = None;

    while let Some(event) = channel.next_event().await? {
        match event {
            ExecEvent::Stdout(data) => {
                let room = MAX_STDOUT_BYTES.saturating_sub(stdout.len());
                stdout.extend_from_slice(&data[..data.len().min(room)]);
            }
            ExecEvent::Stderr(data) => diagnostics.push(&data),
            ExecEvent::ExitStatus(status) => exit_status = Some(status),
            ExecEvent::ExitSignal(signal) => exit_signal = Some(signal),
        }
    }

    Ok(CommandResult {
        exit_status,
        exit_signal,
        stdout: String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::to_string)
            .collect(),
        ..Default::default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagnosticEcho {
    Plain,
    Masked,
}

/// Replace the text after the last `:` (or the whole line) with asterisks
fn mask_secret(line: &str) -> String {
    match line.rfind(':') {
        Some(idx) if !line[idx + 1..].trim().is_empty() => format!("{} ********", &line[..=idx]),
        Some(_) => line.to_string(),
        None if line.trim().is_empty() => line.to_string(),
        None => "********".to_string(),
    }
}

/// Line splitter for stderr that stops buffering after `MAX_DIAGNOSTIC_LINES`
#[derive(Debug, Default)]
struct DiagnosticCapture {
    lines: Vec<String>,
    pending: Vec<u8>,
}

impl DiagnosticCapture {
    fn is_full(&self) -> bool {
        self.lines.len() >= MAX_DIAGNOSTIC_LINES
    }

    fn push(&mut self, data: &[u8]) {
        for &byte in data {
            if self.is_full() {
                return;
            }
            if byte == b'\n' {
                self.finish_line();
            } else if self.pending.len() < MAX_DIAGNOSTIC_LINE_BYTES {
                self.pending.push(byte);
            }
        }
    }

    fn finish_line(&mut self) {
        let line = String::from_utf8_lossy(&self.pending);
        self.lines.push(line.trim_end_matches('\r').to_string());
        self.pending.clear();
    }

    fn finish(mut self) -> Vec<String> {
        if !self.pending.is_empty() && !self.is_full() {
            self.finish_line();
        }
        self.lines
    }
}

/// Stderr lines wrapped in the server warnings banner; empty when there are none
pub fn diagnostic_log_lines(stderr: &[String]) -> Vec<String> {
    if stderr.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(stderr.len() + 3);
    out.push(DIAGNOSTIC_RULE.to_string());
    out.push(DIAGNOSTIC_HEADER.to_string());
    out.extend(stderr.iter().cloned());
    out.push(DIAGNOSTIC_RULE.to_string());
    out
}
