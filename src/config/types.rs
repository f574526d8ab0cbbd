//! Configuration file types

use std::time::Duration;

use serde::Deserialize;

/// Current config file version
pub const CONFIG_VERSION: u32 = 1;

/// Top-level configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Remote TurboVNC server settings
    #[serde(default)]
    pub session_manager: SessionManagerConfig,

    /// SSH connection defaults
    #[serde(default)]
    pub ssh: SshDefaults,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            session_manager: SessionManagerConfig::default(),
            ssh: SshDefaults::default(),
        }
    }
}

/// Session manager settings.
///
/// `server_dir` and `server_args` are explicit overrides; when unset, the
/// `TVNC_SERVERDIR` / `TVNC_SERVERARGS` environment variables apply.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionManagerConfig {
    /// TurboVNC installation directory on the remote host
    #[serde(default)]
    pub server_dir: Option<String>,

    /// Extra arguments appended to `vncserver -sessionstart`
    #[serde(default)]
    pub server_args: Option<String>,

    /// Generate a one-time password for the chosen session
    #[serde(default = "default_auto_otp")]
    pub auto_otp: bool,

    /// Deadline for each remote command in seconds (0 = no deadline)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl SessionManagerConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            server_dir: None,
            server_args: None,
            auto_otp: default_auto_otp(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

/// SSH defaults used by the command-line front end
#[derive(Debug, Clone, Deserialize)]
pub struct SshDefaults {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    /// Private key used instead of password authentication
    #[serde(default)]
    pub identity_file: Option<String>,

    #[serde(default)]
    pub strict_host_key_checking: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for SshDefaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            username: None,
            identity_file: None,
            strict_host_key_checking: false,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_auto_otp() -> bool {
    true
}

fn default_command_timeout() -> u64 {
    30
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    30
}
