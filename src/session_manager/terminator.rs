//! Session Terminator

use tracing::info;

use super::collaborators::{ErrorPresenter, SuppressGuard};
use super::error::Result;
use super::runner::RemoteRunner;
use super::types::SessionId;

/// Run `vncserver -kill <id>` with `presenter` muted for the duration of the call
pub async fn kill_session(
    runner: &RemoteRunner<'_>,
    session: &SessionId,
    presenter: &dyn ErrorPresenter,
) -> Result<()> {
    info!("Killing TurboVNC session {}{}", runner.host(), session);

    let _mute = SuppressGuard::new(presenter);
    runner.run(runner.commands().kill(session)).await?;
    Ok(())
}
