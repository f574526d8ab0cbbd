//! Session Launcher: start a new TurboVNC session

use tracing::{debug, info};

use super::error::{Result, SessionManagerError};
use super::parser::parse_start_output;
use super::runner::RemoteRunner;
use super::types::SessionId;

/// Run `vncserver -sessionstart [args]` and return the new session's identifier.
///
/// Exit status 0 alone is not success: the first stdout token must be present.
pub async fn start_session(runner: &RemoteRunner<'_>) -> Result<SessionId> {
    info!("Starting new TurboVNC session on host {}", runner.host());

    let command = runner.commands().start();
    let result = runner.run(command.clone()).await?;

    let session = parse_start_output(&result.stdout).ok_or_else(|| {
        SessionManagerError::UnparsableServerOutput {
            command,
            host: runner.host().to_string(),
        }
    })?;

    debug!("Started session {}{}", runner.host(), session);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_manager::commands::ServerCommands;
    use crate::session_manager::testing::{Reply, ScriptedTransport};

    fn runner<'a>(transport: &'a ScriptedTransport, args: Option<&str>) -> RemoteRunner<'a> {
        RemoteRunner::new(
            transport,
            "h",
            ServerCommands::new("/opt/TurboVNC", args.map(str::to_string)),
            None,
        )
    }

    #[tokio::test]
    async fn test_first_token_is_new_session() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/opt/TurboVNC/bin/vncserver -sessionstart",
            Reply::ok("vnc3 1234\n"),
        );

        let session = start_session(&runner(&transport, None)).await.unwrap();
        assert_eq!(session, SessionId::from("vnc3"));
    }

    #[tokio::test]
    async fn test_extra_args_appended() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/opt/TurboVNC/bin/vncserver -sessionstart -geometry 1280x800",
            Reply::ok(":7\n"),
        );

        let session = start_session(&runner(&transport, Some("-geometry 1280x800")))
            .await
            .unwrap();
        assert_eq!(session.as_str(), ":7");
    }

    #[tokio::test]
    async fn test_empty_stdout_with_exit_zero_is_unparsable() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/opt/TurboVNC/bin/vncserver -sessionstart",
            Reply::ok("").stderr("New 'h:7 (alice)' desktop is h:7\n"),
        );

        let err = start_session(&runner(&transport, None)).await.unwrap_err();
        assert!(matches!(err, SessionManagerError::UnparsableServerOutput { .. }));
    }

    #[tokio::test]
    async fn test_not_installed() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/opt/TurboVNC/bin/vncserver -sessionstart",
            Reply::status(127).stdout(":1\n"),
        );

        let err = start_session(&runner(&transport, None)).await.unwrap_err();
        assert!(err.is_server_not_installed());
    }
}
