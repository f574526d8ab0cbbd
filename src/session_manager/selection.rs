//! Session Selection Loop
//!
//! ```text
//! Start → Listing → AwaitingDecision ─┬─ ConnectExisting ─────────→ Connecting
//!            ↑                        ├─ ConnectNew → Launching ──→ Connecting
//!            └──────── Killing ←──────┼─ KillExisting
//!                                     └─ Cancel ──────────────────→ Cancelled
//! ```
//!
//! The list is fetched fresh on every pass. Only the first pass may skip the
//! picker (empty list ⇒ start a session straight away).
//!
//! Listing and launching errors end the loop. Credential and kill errors are
//! logged and never leave `create_session`.

use tracing::{debug, info, warn};

use super::collaborators::{CredentialSink, ErrorPresenter, SessionPicker};
use super::commands::ServerCommands;
use super::credential::generate_otp;
use super::directory::list_sessions;
use super::error::Result;
use super::launcher::start_session;
use super::runner::RemoteRunner;
use super::terminator::kill_session;
use super::transport::ExecTransport;
use super::types::{SelectionDecision, SessionId, SessionOutcome};
use crate::config::ServerSettings;

/// External collaborators of one `create_session` invocation
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub picker: &'a dyn SessionPicker,
    pub credentials: &'a dyn CredentialSink,
    pub errors: &'a dyn ErrorPresenter,
}

/// Per-invocation session manager context for one host
pub struct SessionManager<'a> {
    runner: RemoteRunner<'a>,
    auto_otp: bool,
    collaborators: Collaborators<'a>,
}

impl<'a> SessionManager<'a> {
    pub fn new(
        transport: &'a dyn ExecTransport,
        host: impl Into<String>,
        settings: &ServerSettings,
        collaborators: Collaborators<'a>,
    ) -> Self {
        let commands = ServerCommands::new(
            settings.server_dir.clone(),
            settings.server_args.clone(),
        );
        Self {
            runner: RemoteRunner::new(transport, host, commands, settings.command_timeout),
            auto_otp: settings.auto_otp,
            collaborators,
        }
    }

    pub fn host(&self) -> &str {
        self.runner.host()
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionId>> {
        list_sessions(&self.runner).await
    }

    pub async fn start_session(&self) -> Result<SessionId> {
        start_session(&self.runner).await
    }

    pub async fn kill_session(&self, session: &SessionId) -> Result<()> {
        kill_session(&self.runner, session, self.collaborators.errors).await
    }

    /// Generate a one-time password for `session` and hand it to the credential sink.
    ///
    /// Returns whether a password was stored.
    pub async fn provision_credential(&self, session: &SessionId) -> Result<bool> {
        match generate_otp(&self.runner, session, self.collaborators.errors).await? {
            Some(otp) => {
                self.collaborators.credentials.set_credential(otp);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drive listing, picking, starting and killing until the user connects or cancels
    pub async fn create_session(&self) -> Result<SessionOutcome> {
        let host = self.host();
        let mut first_pass = true;

        loop {
            let sessions = self.list_sessions().await?;

            let decision = if first_pass && sessions.is_empty() {
                debug!("No sessions running on {}, starting one", host);
                SelectionDecision::ConnectNew
            } else {
                self.collaborators.picker.present(&sessions, host).await
            };
            first_pass = false;

            match decision {
                SelectionDecision::Cancel => {
                    info!("Session selection on {} cancelled", host);
                    return Ok(SessionOutcome::Cancelled);
                }
                SelectionDecision::ConnectNew => {
                    let session = self.start_session().await?;
                    return Ok(self.connect(session).await);
                }
                SelectionDecision::ConnectExisting(session) => {
                    return Ok(self.connect(session).await);
                }
                SelectionDecision::KillExisting(session) => {
                    if let Err(e) = self.kill_session(&session).await {
                        warn!("Failed to kill session {}{}: {}", host, session, e);
                    }
                }
            }
        }
    }

    async fn connect(&self, session: SessionId) -> SessionOutcome {
        if self.auto_otp {
            match self.provision_credential(&session).await {
                Ok(true) => debug!("One-time password stored for {}{}", self.host(), session),
                Ok(false) => {}
                Err(e) => warn!(
                    "Failed to generate one-time password for {}{}: {}",
                    self.host(),
                    session,
                    e
                ),
            }
        }

        info!("Selected session {}{}", self.host(), session);
        SessionOutcome::Connect {
            host: self.host().to_string(),
            session,
        }
    }
}
