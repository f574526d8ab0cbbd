//! SSH Configuration

use std::path::PathBuf;
use std::time::Duration;

/// SSH connection configuration, assembled by the CLI for one connection
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    pub port: u16,

    /// Username for authentication
    pub username: String,

    pub auth: AuthMethod,

    /// Connection timeout in seconds (0 = wait for the TCP stack)
    pub timeout_secs: u64,

    /// Strict host key checking
    /// - true: reject connections to unknown hosts
    /// - false: learn unknown hosts, still reject changed keys
    pub strict_host_key_checking: bool,

    /// Alternate known_hosts file (default: ~/.ssh/known_hosts)
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Handshake deadline; `None` when `timeout_secs` is 0
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Authentication methods supported
#[derive(Clone)]
pub enum AuthMethod {
    /// Password authentication
    Password { password: String },

    /// SSH key authentication
    Key {
        /// Path to private key file
        key_path: String,
        /// Optional passphrase for encrypted keys
        passphrase: Option<String>,
    },
}

impl AuthMethod {
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password {
            password: password.into(),
        }
    }

    pub fn key(key_path: impl Into<String>, passphrase: Option<String>) -> Self {
        Self::Key {
            key_path: key_path.into(),
            passphrase,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { .. } => f.write_str("Password { .. }"),
            Self::Key { key_path, .. } => f
                .debug_struct("Key")
                .field("key_path", key_path)
                .finish_non_exhaustive(),
        }
    }
}

/// A VNC server name split into its SSH-relevant parts.
///
/// Accepted forms: `host`, `host:1`, `host::5901`, `[::1]:1`, `user@host:2`.
/// Unbracketed IPv6 literals are not supported; the first colon always
/// starts the display suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName {
    pub user: Option<String>,
    pub host: String,
    /// Display or port suffix including its leading colon(s), e.g. `:1`
    pub display: Option<String>,
}

/// Split a VNC server name into user, host and display suffix.
///
/// Returns `None` when no host can be extracted.
pub fn parse_server_name(server_name: &str) -> Option<ServerName> {
    let trimmed = server_name.trim();
    let (user, rest) = match trimmed.rsplit_once('@') {
        Some((user, rest)) if !user.is_empty() => (Some(user.to_string()), rest),
        Some((_, rest)) => (None, rest),
        None => (None, trimmed),
    };

    let (host, suffix) = if let Some(bracketed) = rest.strip_prefix('[') {
        let end = bracketed.find(']')?;
        (&bracketed[..end], &bracketed[end + 1..])
    } else {
        match rest.find(':') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        }
    };

    if host.is_empty() {
        return None;
    }

    Some(ServerName {
        user,
        host: host.to_string(),
        display: (!suffix.is_empty()).then(|| suffix.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_host() {
        let name = parse_server_name("vnc.example.com").unwrap();
        assert_eq!(name.host, "vnc.example.com");
        assert!(name.user.is_none());
        assert!(name.display.is_none());
    }

    #[test]
    fn test_parse_display_and_port_suffix() {
        let name = parse_server_name("vnc.example.com:1").unwrap();
        assert_eq!(name.host, "vnc.example.com");
        assert_eq!(name.display.as_deref(), Some(":1"));

        let name = parse_server_name("vnc.example.com::5901").unwrap();
        assert_eq!(name.host, "vnc.example.com");
        assert_eq!(name.display.as_deref(), Some("::5901"));
    }

    #[test]
    fn test_parse_user_and_ipv6() {
        let name = parse_server_name("alice@[fe80::1]:2").unwrap();
        assert_eq!(name.user.as_deref(), Some("alice"));
        assert_eq!(name.host, "fe80::1");
        assert_eq!(name.display.as_deref(), Some(":2"));
    }

    #[test]
    fn test_parse_rejects_empty_host() {
        assert!(parse_server_name("").is_none());
        assert!(parse_server_name(":1").is_none());
        assert!(parse_server_name("bob@").is_none());
        assert!(parse_server_name("[fe80::1").is_none());
    }

    #[test]
    fn test_zero_connect_timeout_disables_deadline() {
        let mut config = SshConfig {
            host: "vnchost".into(),
            port: 22,
            username: "alice".into(),
            auth: AuthMethod::password("x"),
            timeout_secs: 0,
            strict_host_key_checking: false,
            known_hosts_path: None,
        };
        assert_eq!(config.connect_timeout(), None);

        config.timeout_secs = 15;
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_auth_debug_redacts_secrets() {
        let auth = AuthMethod::password("hunter2");
        assert!(!format!("{:?}", auth).contains("hunter2"));

        let auth = AuthMethod::key("/home/a/.ssh/id_ed25519", Some("pass".into()));
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("id_ed25519"));
        assert!(!rendered.contains("pass\""));
    }
}
