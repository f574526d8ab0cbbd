//! Remote TurboVNC command lines

use super::types::SessionId;

/// Builds the fixed command lines for one resolved installation directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommands {
    server_dir: String,
    server_args: Option<String>,
}

impl ServerCommands {
    pub fn new(server_dir: impl Into<String>, server_args: Option<String>) -> Self {
        Self {
            server_dir: server_dir.into(),
            server_args,
        }
    }

    pub fn server_dir(&self) -> &str {
        &self.server_dir
    }

    fn binary(&self, name: &str) -> String {
        let dir = self.server_dir.trim_end_matches('/');
        shell_quote(&format!("{}/bin/{}", dir, name))
    }

    /// `<dir>/bin/vncserver -sessionlist`
    pub fn list(&self) -> String {
        format!("{} -sessionlist", self.binary("vncserver"))
    }

    /// `<dir>/bin/vncserver -sessionstart [args]`; args are passed through verbatim
    pub fn start(&self) -> String {
        match &self.server_args {
            Some(args) => format!("{} -sessionstart {}", self.binary("vncserver"), args),
            None => format!("{} -sessionstart", self.binary("vncserver")),
        }
    }

    /// `<dir>/bin/vncpasswd -o -display <id>`
    pub fn generate_otp(&self, session: &SessionId) -> String {
        format!(
            "{} -o -display {}",
            self.binary("vncpasswd"),
            shell_quote(session.as_str())
        )
    }

    /// `<dir>/bin/vncserver -kill <id>`
    pub fn kill(&self, session: &SessionId) -> String {
        format!(
            "{} -kill {}",
            self.binary("vncserver"),
            shell_quote(session.as_str())
        )
    }
}

/// Single-quote `s` for a POSIX shell unless every character is already safe
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-' | '+' | '=' | '@' | ',' | '%')
        });
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
