//! russh exec channels behind the session manager's `ExecTransport` seam

use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tracing::debug;

use super::error::SshError;
use super::handle_owner::TransportController;
use crate::session_manager::{ExecChannel, ExecEvent, ExecTransport};

/// SSH extended data type for stderr
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Exec channel backed by a russh session channel
pub struct RusshExecChannel {
    channel: Channel<Msg>,
    closed: bool,
}

#[async_trait]
impl ExecChannel for RusshExecChannel {
    async fn next_event(&mut self) -> Result<Option<ExecEvent>, SshError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    return Ok(Some(ExecEvent::Stdout(data.to_vec())));
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == SSH_EXTENDED_DATA_STDERR {
                        return Ok(Some(ExecEvent::Stderr(data.to_vec())));
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    return Ok(Some(ExecEvent::ExitStatus(exit_status)));
                }
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    return Ok(Some(ExecEvent::ExitSignal(format!("{:?}", signal_name))));
                }
                // exit-status may still follow EOF
                Some(ChannelMsg::Eof) => {}
                Some(ChannelMsg::Close) | None => {
                    self.closed = true;
                    return Ok(None);
                }
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), SshError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.channel
            .close()
            .await
            .map_err(|e| SshError::ChannelError(e.to_string()))
    }
}

#[async_trait]
impl ExecTransport for TransportController {
    async fn open_exec(&self, command: &str) -> Result<Box<dyn ExecChannel>, SshError> {
        let mut channel = self.open_session_channel().await?;

        debug!("exec: {}", command);

        if let Err(e) = channel.exec(true, command).await {
            let _ = channel.close().await;
            return Err(SshError::ExecFailed(e.to_string()));
        }

        Ok(Box::new(RusshExecChannel {
            channel,
            closed: false,
        }))
    }
}
