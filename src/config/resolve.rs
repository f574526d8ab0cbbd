//! Override → environment → default resolution of remote server settings

use std::time::Duration;

use super::types::SessionManagerConfig;

/// Default TurboVNC installation directory
pub const DEFAULT_SERVER_DIR: &str = "/opt/TurboVNC";

/// Environment variable naming the installation directory
pub const SERVER_DIR_ENV: &str = "TVNC_SERVERDIR";

/// Environment variable carrying extra `-sessionstart` arguments
pub const SERVER_ARGS_ENV: &str = "TVNC_SERVERARGS";

/// Fully resolved settings for one `create_session` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub server_dir: String,
    pub server_args: Option<String>,
    pub auto_otp: bool,
    pub command_timeout: Option<Duration>,
}

impl ServerSettings {
    /// Resolve against the process environment
    pub fn resolve(config: &SessionManagerConfig) -> Self {
        Self::resolve_with(config, process_env)
    }

    /// Resolve with an injected environment lookup
    pub fn resolve_with<F>(config: &SessionManagerConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server_dir: resolve_server_dir(config.server_dir.as_deref(), &env),
            server_args: resolve_server_args(config.server_args.as_deref(), &env),
            auto_otp: config.auto_otp,
            command_timeout: config.command_timeout(),
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Explicit override, then `TVNC_SERVERDIR`, then `/opt/TurboVNC`
fn resolve_server_dir<F>(override_dir: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(override_dir.map(str::to_string))
        .or_else(|| non_blank(env(SERVER_DIR_ENV)))
        .unwrap_or_else(|| DEFAULT_SERVER_DIR.to_string())
}

/// Explicit override, then `TVNC_SERVERARGS`, then nothing
fn resolve_server_args<F>(override_args: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(override_args.map(str::to_string)).or_else(|| non_blank(env(SERVER_ARGS_ENV)))
}
