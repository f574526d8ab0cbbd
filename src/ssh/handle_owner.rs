//! Transport Owner Task
//!
//! Only one task owns the russh `Handle<ClientHandler>`. Everything else talks
//! to it through a cloneable `TransportController`, which serialises channel
//! opens on the shared connection.
//!
//! ```ignore
//! let controller = spawn_transport_owner(handle, "alice@vnc:22".into());
//! let channel = controller.open_session_channel().await?;
//! ```

use russh::client::{Handle, Msg};
use russh::Channel;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::client::ClientHandler;
use super::error::SshError;

/// Commands sent to the owner task
pub enum TransportCommand {
    /// Open a session channel (used for exec requests)
    OpenSession {
        reply_tx: oneshot::Sender<Result<Channel<Msg>, russh::Error>>,
    },

    /// Disconnect the SSH connection
    Disconnect,
}

/// Cloneable sender side of the owner task
#[derive(Clone)]
pub struct TransportController {
    cmd_tx: mpsc::Sender<TransportCommand>,
}

impl TransportController {
    /// Wrap an existing command sender. Tests use this to stand in for the owner task.
    pub fn new(cmd_tx: mpsc::Sender<TransportCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Open a session channel
    pub async fn open_session_channel(&self) -> Result<Channel<Msg>, SshError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(TransportCommand::OpenSession { reply_tx })
            .await
            .map_err(|_| SshError::Disconnected)?;
        reply_rx
            .await
            .map_err(|_| SshError::Disconnected)?
            .map_err(|e| SshError::ChannelError(e.to_string()))
    }

    /// Disconnect the SSH connection
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(TransportCommand::Disconnect).await;
    }

    /// Check if the owner task is still running
    pub fn is_connected(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}

/// Spawn the owner task, consuming the handle
pub fn spawn_transport_owner(handle: Handle<ClientHandler>, label: String) -> TransportController {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TransportCommand>(16);

    tokio::spawn(async move {
        let handle = handle;

        info!("Transport owner task started for {}", label);

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                TransportCommand::OpenSession { reply_tx } => {
                    let result = handle.channel_open_session().await;
                    if reply_tx.send(result).is_err() {
                        // Dropped channel is closed by the server side
                        warn!("Caller dropped before receiving channel_open_session result");
                    }
                }
                TransportCommand::Disconnect => {
                    info!("Disconnect requested for {}", label);
                    break;
                }
            }
        }

        drain_pending_commands(&mut cmd_rx);

        let _ = handle
            .disconnect(russh::Disconnect::ByApplication, "Session closed", "en")
            .await;
        info!("Transport owner task terminated for {}", label);
    });

    TransportController { cmd_tx }
}

/// Answer every queued command with a disconnect error
fn drain_pending_commands(cmd_rx: &mut mpsc::Receiver<TransportCommand>) {
    cmd_rx.close();

    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            TransportCommand::OpenSession { reply_tx } => {
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            TransportCommand::Disconnect => {}
        }
    }
}
