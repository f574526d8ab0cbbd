use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigFile, ServerSettings};
use crate::ssh::{parse_server_name, AuthMethod, SshConfig};

/// Environment variable holding the SSH password when no identity file is used
pub const PASSWORD_ENV: &str = "TVNC_SSH_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "tvnc-session")]
#[command(about = "List, start and kill TurboVNC sessions over SSH and pick one to connect to")]
#[command(version)]
pub struct Cli {
    /// VNC server name: [user@]host[:display]
    pub server: String,

    /// SSH port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SSH user name
    #[arg(short = 'l', long = "user", value_name = "USER")]
    pub user: Option<String>,

    /// Private key for public key authentication
    #[arg(short, long, value_name = "FILE")]
    pub identity: Option<PathBuf>,

    /// TurboVNC installation directory on the remote host
    #[arg(long, value_name = "DIR")]
    pub server_dir: Option<String>,

    /// Extra arguments for `vncserver -sessionstart`
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub server_args: Option<String>,

    /// Do not generate a one-time password for the chosen session
    #[arg(long)]
    pub no_otp: bool,

    /// Per-command deadline in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Refuse hosts whose key is not in known_hosts
    #[arg(long)]
    pub strict_host_key_checking: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    #[error("No SSH user given; use -l or user@host")]
    MissingUser,

    #[error("No identity file given and TVNC_SSH_PASSWORD is not set")]
    MissingPassword,
}

impl Cli {
    /// Fold command-line overrides into the loaded config file
    pub fn apply(&self, mut config: ConfigFile) -> ConfigFile {
        let sm = &mut config.session_manager;
        if let Some(dir) = &self.server_dir {
            sm.server_dir = Some(dir.clone());
        }
        if let Some(args) = &self.server_args {
            sm.server_args = Some(args.clone());
        }
        if self.no_otp {
            sm.auto_otp = false;
        }
        if let Some(secs) = self.timeout {
            sm.command_timeout_secs = secs;
        }

        let ssh = &mut config.ssh;
        if let Some(port) = self.port {
            ssh.port = port;
        }
        if let Some(user) = &self.user {
            ssh.username = Some(user.clone());
        }
        if let Some(identity) = &self.identity {
            ssh.identity_file = Some(identity.to_string_lossy().into_owned());
        }
        if self.strict_host_key_checking {
            ssh.strict_host_key_checking = true;
        }
        config
    }

    pub fn server_settings(&self, config: &ConfigFile) -> ServerSettings {
        ServerSettings::resolve(&config.session_manager)
    }

    /// Build the SSH connection settings.
    ///
    /// `-l` beats `user@` in the server name, which beats the config file.
    pub fn ssh_config<F>(&self, config: &ConfigFile, env: F) -> Result<SshConfig, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = parse_server_name(&self.server)
            .ok_or_else(|| CliError::InvalidServerName(self.server.clone()))?;

        let username = self
            .user
            .clone()
            .or(name.user)
            .or_else(|| config.ssh.username.clone())
            .ok_or(CliError::MissingUser)?;

        let auth = match &config.ssh.identity_file {
            Some(path) => AuthMethod::key(path.clone(), env(PASSWORD_ENV)),
            None => AuthMethod::password(env(PASSWORD_ENV).ok_or(CliError::MissingPassword)?),
        };

        Ok(SshConfig {
            host: name.host,
            port: config.ssh.port,
            username,
            auth,
            timeout_secs: config.ssh.connect_timeout_secs,
            strict_host_key_checking: config.ssh.strict_host_key_checking,
            known_hosts_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tvnc-session").chain(args.iter().copied())).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let cli = parse(&[
            "--server-dir",
            "/usr/local/TurboVNC",
            "--server-args",
            "-geometry 1280x1024",
            "--no-otp",
            "--timeout",
            "0",
            "-p",
            "2222",
            "vnchost:1",
        ]);
        let config = cli.apply(ConfigFile::default());
        assert_eq!(config.session_manager.server_dir.as_deref(), Some("/usr/local/TurboVNC"));
        assert_eq!(
            config.session_manager.server_args.as_deref(),
            Some("-geometry 1280x1024")
        );
        assert!(!config.session_manager.auto_otp);
        assert_eq!(config.session_manager.command_timeout(), None);
        assert_eq!(config.ssh.port, 2222);
    }

    #[test]
    fn test_untouched_file_values_survive() {
        let mut file = ConfigFile::default();
        file.session_manager.server_dir = Some("/srv/tvnc".into());
        file.ssh.port = 2200;

        let config = parse(&["vnchost"]).apply(file);
        assert_eq!(config.session_manager.server_dir.as_deref(), Some("/srv/tvnc"));
        assert!(config.session_manager.auto_otp);
        assert_eq!(config.ssh.port, 2200);
    }

    #[test]
    fn test_ssh_config_password_from_env() {
        let cli = parse(&["alice@vnchost:2"]);
        let config = cli.apply(ConfigFile::default());
        let ssh = cli
            .ssh_config(&config, env_of(&[(PASSWORD_ENV, "hunter2")]))
            .unwrap();
        assert_eq!(ssh.host, "vnchost");
        assert_eq!(ssh.username, "alice");
        assert_eq!(ssh.port, 22);
        assert!(matches!(ssh.auth, AuthMethod::Password { ref password } if password == "hunter2"));
    }

    #[test]
    fn test_ssh_config_user_flag_wins() {
        let cli = parse(&["-l", "bob", "-i", "/home/bob/.ssh/id_ed25519", "alice@vnchost"]);
        let config = cli.apply(ConfigFile::default());
        let ssh = cli.ssh_config(&config, env_of(&[])).unwrap();
        assert_eq!(ssh.username, "bob");
        assert!(matches!(ssh.auth, AuthMethod::Key { .. }));
    }

    #[test]
    fn test_ssh_config_errors() {
        let cli = parse(&["vnchost"]);
        let config = cli.apply(ConfigFile::default());
        assert!(matches!(
            cli.ssh_config(&config, env_of(&[(PASSWORD_ENV, "x")])),
            Err(CliError::MissingUser)
        ));

        let cli = parse(&["-l", "alice", "vnchost"]);
        let config = cli.apply(ConfigFile::default());
        assert!(matches!(
            cli.ssh_config(&config, env_of(&[])),
            Err(CliError::MissingPassword)
        ));

        let cli = parse(&["-l", "alice", ":1"]);
        assert!(matches!(
            cli.ssh_config(&ConfigFile::default(), env_of(&[(PASSWORD_ENV, "x")])),
            Err(CliError::InvalidServerName(_))
        ));
    }
}
