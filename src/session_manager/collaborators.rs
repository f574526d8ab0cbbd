//! Collaborators the session manager consumes.
//!
//! The picker, credential sink and error presenter all belong to one
//! `create_session` invocation; nothing here is process-global.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::types::{OneTimePassword, SelectionDecision, SessionId};

/// Turns a session list into a user decision
#[async_trait]
pub trait SessionPicker: Send + Sync {
    async fn present(&self, sessions: &[SessionId], host: &str) -> SelectionDecision;
}

/// Receives the one-time password generated for the chosen session
pub trait CredentialSink: Send + Sync {
    fn set_credential(&self, credential: OneTimePassword);
}

/// User-facing error presentation that can be muted around non-fatal calls
pub trait ErrorPresenter: Send + Sync {
    fn set_suppressed(&self, suppressed: bool);
}

/// In-memory credential sink
#[derive(Default)]
pub struct CredentialSlot {
    credential: Mutex<Option<OneTimePassword>>,
    writes: Mutex<usize>,
}

impl CredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the stored credential, leaving the slot empty
    pub fn take(&self) -> Option<OneTimePassword> {
        self.credential.lock().take()
    }

    /// Number of times a credential was written
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl CredentialSink for CredentialSlot {
    fn set_credential(&self, credential: OneTimePassword) {
        *self.credential.lock() = Some(credential);
        *self.writes.lock() += 1;
    }
}

/// Per-invocation suppression flag
#[derive(Debug, Default)]
pub struct ErrorSuppression {
    suppressed: AtomicBool,
}

impl ErrorSuppression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }
}

impl ErrorPresenter for ErrorSuppression {
    fn set_suppressed(&self, suppressed: bool) {
        self.suppressed.store(suppressed, Ordering::SeqCst);
    }
}

/// Mutes an `ErrorPresenter` until dropped
pub(crate) struct SuppressGuard<'a> {
    presenter: &'a dyn ErrorPresenter,
}

impl<'a> SuppressGuard<'a> {
    pub(crate) fn new(presenter: &'a dyn ErrorPresenter) -> Self {
        presenter.set_suppressed(true);
        Self { presenter }
    }
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.presenter.set_suppressed(false);
    }
}
