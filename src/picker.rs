//! Line-oriented session picker for terminals

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::Mutex;
use tracing::warn;

use crate::session_manager::{SelectionDecision, SessionId, SessionPicker};

const PROMPT: &str = "Select [<n>] connect, [k<n>] kill, [n] new, [q] cancel: ";

/// Interpret one line of picker input against the list it was shown.
///
/// Indices are 1-based. Returns `None` for anything unrecognized.
pub fn parse_choice(input: &str, sessions: &[SessionId]) -> Option<SelectionDecision> {
    let choice = input.trim().to_ascii_lowercase();
    let pick = |digits: &str| {
        digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| sessions.get(idx))
            .cloned()
    };

    match choice.as_str() {
        "q" | "quit" => Some(SelectionDecision::Cancel),
        "n" | "new" => Some(SelectionDecision::ConnectNew),
        other => match other.strip_prefix('k') {
            Some(rest) => pick(rest.trim()).map(SelectionDecision::KillExisting),
            None => pick(other).map(SelectionDecision::ConnectExisting),
        },
    }
}

/// Render the numbered list shown before the prompt
pub fn render_sessions(sessions: &[SessionId], host: &str) -> String {
    if sessions.is_empty() {
        return format!("No TurboVNC sessions running on {}\n", host);
    }
    let mut out = format!("TurboVNC sessions on {}:\n", host);
    for (i, session) in sessions.iter().enumerate() {
        out.push_str(&format!("  {:>2}) {}{}\n", i + 1, host, session));
    }
    out
}

/// Picker reading choices line by line. End of input cancels.
pub struct TerminalPicker<R, W> {
    input: Mutex<Lines<R>>,
    output: Mutex<W>,
}

impl<R, W> TerminalPicker<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input.lines()),
            output: Mutex::new(output),
        }
    }

    async fn write(&self, text: &str) -> std::io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await
    }

    async fn prompt(&self, sessions: &[SessionId], host: &str) -> std::io::Result<SelectionDecision> {
        self.write(&render_sessions(sessions, host)).await?;
        loop {
            self.write(PROMPT).await?;
            let line = match self.input.lock().await.next_line().await? {
                Some(line) => line,
                None => return Ok(SelectionDecision::Cancel),
            };
            match parse_choice(&line, sessions) {
                Some(decision) => return Ok(decision),
                None => self.write(&format!("Invalid choice: {}\n", line.trim())).await?,
            }
        }
    }
}

impl TerminalPicker<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    /// Prompt on stderr, read from stdin
    pub fn stdio() -> Self {
        Self::new(
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stderr(),
        )
    }
}

#[async_trait]
impl<R, W> SessionPicker for TerminalPicker<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn present(&self, sessions: &[SessionId], host: &str) -> SelectionDecision {
        match self.prompt(sessions, host).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Session picker I/O failed: {}", e);
                SelectionDecision::Cancel
            }
        }
    }
}
