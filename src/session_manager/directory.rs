//! Session Directory: which TurboVNC sessions are running on the host

use tracing::debug;

use super::error::Result;
use super::parser::parse_session_list;
use super::runner::RemoteRunner;
use super::types::SessionId;

/// Run `vncserver -sessionlist` and return the identifiers it prints.
///
/// No stdout line means no sessions. Runner errors propagate unchanged.
pub async fn list_sessions(runner: &RemoteRunner<'_>) -> Result<Vec<SessionId>> {
    let result = runner.run(runner.commands().list()).await?;
    let sessions = parse_session_list(&result.stdout);

    debug!(
        "Available sessions on {}: {}",
        runner.host(),
        result.first_error_line.as_deref().unwrap_or("None")
    );

    Ok(sessions)
}
