//! Session manager error taxonomy

use thiserror::Error;

use crate::ssh::SshError;

#[derive(Error, Debug)]
pub enum SessionManagerError {
    /// Channel could not be opened, transport broke, or the deadline expired
    #[error("Could not execute\n    {command}\non host {host}: {source}")]
    Execution {
        command: String,
        host: String,
        #[source]
        source: SshError,
    },

    /// Remote shell reported exit status 127
    #[error(
        "Could not execute\n    {command}\non host {host}.\nIs the TurboVNC Server installed in {server_dir} ?"
    )]
    ServerNotInstalled {
        command: String,
        host: String,
        server_dir: String,
    },

    /// Any other non-zero (or missing) exit status
    #[error("Could not execute\n    {command}\non host {host}{}", detail_suffix(.detail))]
    RemoteCommandFailed {
        command: String,
        host: String,
        exit_status: Option<u32>,
        detail: Option<String>,
    },

    /// Exit status 0 but no usable result in the output
    #[error("Could not parse TurboVNC Server output of\n    {command}\non host {host}")]
    UnparsableServerOutput { command: String, host: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(line) => format!(":\n    {}", line),
        None => String::new(),
    }
}

impl SessionManagerError {
    /// True when the failure suggests fixing the server directory setting
    pub fn is_server_not_installed(&self) -> bool {
        matches!(self, Self::ServerNotInstalled { .. })
    }
}

pub type Result<T> = std::result::Result<T, SessionManagerError>;
