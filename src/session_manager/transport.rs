//! Exec seam between the session manager and the SSH connection.
//!
//! The manager only needs "run this command line and give me its output
//! stream"; the russh implementation lives in `crate::ssh::exec`, the scripted
//! one in `super::testing`.

use async_trait::async_trait;

use crate::ssh::SshError;

/// One message read from an exec channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    /// Bytes on the standard output stream
    Stdout(Vec<u8>),
    /// Bytes on the standard error stream (SSH extended data type 1)
    Stderr(Vec<u8>),
    /// Remote process exit status
    ExitStatus(u32),
    /// Remote process was terminated by a signal
    ExitSignal(String),
}

/// A single-use exec channel
#[async_trait]
pub trait ExecChannel: Send {
    /// Next event, or `None` once the channel is closed
    async fn next_event(&mut self) -> Result<Option<ExecEvent>, SshError>;

    /// Close the channel. Safe to call after the remote side already closed it.
    async fn close(&mut self) -> Result<(), SshError>;
}

/// An authenticated connection able to run remote commands
#[async_trait]
pub trait ExecTransport: Send + Sync {
    /// Open a fresh channel and issue `command` on it
    async fn open_exec(&self, command: &str) -> Result<Box<dyn ExecChannel>, SshError>;
}
