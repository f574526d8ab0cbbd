//! Scripted collaborators for unit tests: an in-memory exec transport that
//! replays canned replies per command line, a picker that replays decisions,
//! a presenter that records suppression toggles, and a log capture buffer.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::collaborators::{ErrorPresenter, SessionPicker};
use super::transport::{ExecChannel, ExecEvent, ExecTransport};
use super::types::{SelectionDecision, SessionId};
use crate::ssh::SshError;

/// Canned output of one remote command
#[derive(Debug, Clone, Default)]
pub struct Reply {
    stdout: String,
    stderr: String,
    exit_status: Option<u32>,
    signal: Option<String>,
    broken: bool,
    hang: bool,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self::status(0).stdout(stdout)
    }

    pub fn status(status: u32) -> Self {
        Self {
            exit_status: Some(status),
            ..Default::default()
        }
    }

    pub fn no_status() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn signal(mut self, name: &str) -> Self {
        self.signal = Some(name.to_string());
        self
    }

    /// Transport fails after the stdout bytes
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Channel never closes
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    fn events(&self) -> VecDeque<ExecEvent> {
        let mut events = VecDeque::new();
        if !self.stdout.is_empty() {
            events.push_back(ExecEvent::Stdout(self.stdout.as_bytes().to_vec()));
        }
        // Several small chunks, so line splitting across chunk borders is exercised
        for chunk in self.stderr.as_bytes().chunks(7) {
            events.push_back(ExecEvent::Stderr(chunk.to_vec()));
        }
        if let Some(signal) = &self.signal {
            events.push_back(ExecEvent::ExitSignal(signal.clone()));
        }
        if let Some(status) = self.exit_status {
            events.push_back(ExecEvent::ExitStatus(status));
        }
        events
    }
}

struct ScriptedChannel {
    events: VecDeque<ExecEvent>,
    broken: bool,
    hang: bool,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl ExecChannel for ScriptedChannel {
    async fn next_event(&mut self) -> Result<Option<ExecEvent>, SshError> {
        if self.broken && !matches!(self.events.front(), Some(ExecEvent::Stdout(_))) {
            return Err(SshError::Disconnected);
        }
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None if self.hang => std::future::pending().await,
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), SshError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory `ExecTransport`.
///
/// Replies queued for a command are consumed in order; the last one repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    failing: Mutex<HashSet<String>>,
    issued: Mutex<Vec<String>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, command: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn fail_open(&self, command: &str) {
        self.failing.lock().insert(command.to_string());
    }

    /// Every command line opened, in order
    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.issued.lock().iter().filter(|c| *c == command).count()
    }

    pub fn closed_channels(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecTransport for ScriptedTransport {
    async fn open_exec(&self, command: &str) -> Result<Box<dyn ExecChannel>, SshError> {
        self.issued.lock().push(command.to_string());

        if self.failing.lock().contains(command) {
            return Err(SshError::ChannelError("channel open refused".to_string()));
        }

        let reply = {
            let mut replies = self.replies.lock();
            let queue = replies
                .get_mut(command)
                .ok_or_else(|| SshError::ChannelError(format!("unscripted command: {}", command)))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
        .ok_or_else(|| SshError::ChannelError(format!("no reply for: {}", command)))?;

        Ok(Box::new(ScriptedChannel {
            events: reply.events(),
            broken: reply.broken,
            hang: reply.hang,
            closed: Arc::clone(&self.closed),
        }))
    }
}

/// Picker replaying a fixed list of decisions, then `Cancel`
#[derive(Default)]
pub struct ScriptedPicker {
    decisions: Mutex<VecDeque<SelectionDecision>>,
    presented: Mutex<Vec<Vec<SessionId>>>,
}

impl ScriptedPicker {
    pub fn new(decisions: Vec<SelectionDecision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            presented: Mutex::new(Vec::new()),
        }
    }

    /// Session lists shown so far
    pub fn presented(&self) -> Vec<Vec<SessionId>> {
        self.presented.lock().clone()
    }
}

#[async_trait]
impl SessionPicker for ScriptedPicker {
    async fn present(&self, sessions: &[SessionId], _host: &str) -> SelectionDecision {
        self.presented.lock().push(sessions.to_vec());
        self.decisions
            .lock()
            .pop_front()
            .unwrap_or(SelectionDecision::Cancel)
    }
}

/// Presenter recording every toggle
#[derive(Default)]
pub struct RecordingPresenter {
    toggles: Mutex<Vec<bool>>,
}

impl RecordingPresenter {
    pub fn toggles(&self) -> Vec<bool> {
        self.toggles.lock().clone()
    }
}

impl ErrorPresenter for RecordingPresenter {
    fn set_suppressed(&self, suppressed: bool) {
        self.toggles.lock().push(suppressed);
    }
}

/// Formatted tracing output captured for the current thread
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Route `debug!` and above here until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// `SessionId`s from string literals
pub fn ids(items: &[&str]) -> Vec<SessionId> {
    items.iter().map(|s| SessionId::from(*s)).collect()
}
