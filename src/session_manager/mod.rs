//! Session Manager Module
//!
//! Remote TurboVNC session management over an established SSH transport:
//! list the sessions on a host, let the user pick, kill or start one, and
//! provision a one-time password for the chosen session.
//!
//! # Architecture
//!
//! ```text
//! SessionManager::create_session
//!   ├── directory   (vncserver -sessionlist)
//!   ├── launcher    (vncserver -sessionstart)
//!   ├── credential  (vncpasswd -o -display)
//!   └── terminator  (vncserver -kill)
//!          │
//!          ▼
//!     RemoteRunner ──► ExecTransport (ssh::TransportController)
//! ```

pub mod collaborators;
pub mod commands;
mod credential;
mod directory;
pub mod error;
mod launcher;
pub mod parser;
pub mod runner;
mod selection;
mod terminator;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{
    CredentialSink, CredentialSlot, ErrorPresenter, ErrorSuppression, SessionPicker,
};
pub use commands::{shell_quote, ServerCommands};
pub use error::{Result, SessionManagerError};
pub use runner::{CommandResult, RemoteInvocation, RemoteRunner};
pub use selection::{Collaborators, SessionManager};
pub use transport::{ExecChannel, ExecEvent, ExecTransport};
pub use types::{OneTimePassword, SelectionDecision, SessionId, SessionOutcome};
