//! Credential Provisioner: one-time VNC password for a session
//!
//! `vncpasswd -o` reports the password on stderr, so the result comes from
//! the diagnostic stream rather than stdout.

use tracing::{debug, warn};

use super::collaborators::{ErrorPresenter, SuppressGuard};
use super::error::Result;
use super::parser::parse_credential_line;
use super::runner::RemoteRunner;
use super::types::{OneTimePassword, SessionId};

/// Run `vncpasswd -o -display <id>` and extract the password.
///
/// `presenter` is muted for the duration of the call. `Ok(None)` means the
/// command succeeded but printed nothing that looks like a password.
pub async fn generate_otp(
    runner: &RemoteRunner<'_>,
    session: &SessionId,
    presenter: &dyn ErrorPresenter,
) -> Result<Option<OneTimePassword>> {
    debug!(
        "Generating one-time password for session {}{}",
        runner.host(),
        session
    );

    let _mute = SuppressGuard::new(presenter);
    let result = runner.run_masked(runner.commands().generate_otp(session)).await?;

    let otp = result
        .stderr
        .first()
        .and_then(|line| parse_credential_line(line));
    if otp.is_none() {
        warn!(
            "vncpasswd printed no one-time password for session {}{}",
            runner.host(),
            session
        );
    }
    Ok(otp)
}
