//! Session manager value types

use std::fmt;

use zeroize::Zeroizing;

/// Opaque identifier of a remote TurboVNC session, as printed by the server (e.g. `:1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What the user chose in the session picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionDecision {
    /// Abort; do not connect
    Cancel,
    /// Start a new session and connect to it
    ConnectNew,
    /// Connect to an existing session
    ConnectExisting(SessionId),
    /// Kill an existing session and show the list again
    KillExisting(SessionId),
}

/// Terminal result of `SessionManager::create_session`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Connect { host: String, session: SessionId },
    Cancelled,
}

impl SessionOutcome {
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            Self::Connect { session, .. } => Some(session),
            Self::Cancelled => None,
        }
    }

    /// VNC server name to connect to, e.g. `vnc.example.com:1`
    pub fn connect_target(&self) -> Option<String> {
        match self {
            Self::Connect { host, session } => Some(format!("{}{}", host, session)),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// One-time VNC password; wiped from memory on drop and never printed by `Debug`
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimePassword(Zeroizing<String>);

impl OneTimePassword {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// The password text
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for OneTimePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimePassword(***)")
    }
}
