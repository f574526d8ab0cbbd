//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::PublicKey;
use russh::*;
use tracing::{debug, info, warn};

use super::config::{AuthMethod, SshConfig};
use super::error::SshError;
use super::handle_owner::{spawn_transport_owner, TransportController};
use super::known_hosts::{HostKeyVerification, KnownHosts};

/// Connects and authenticates one transport session
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Connect to the SSH server and hand the authenticated handle to an owner task
    pub async fn connect(self) -> Result<TransportController, SshError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!("Opening SSH connection to {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let known_hosts = self
            .config
            .known_hosts_path
            .clone()
            .map(KnownHosts::with_path)
            .unwrap_or_else(KnownHosts::user_default);

        let handler = ClientHandler::new(
            self.config.host.clone(),
            self.config.port,
            self.config.strict_host_key_checking,
            known_hosts,
        );

        let connecting = client::connect(Arc::new(ssh_config), socket_addr, handler);
        let mut handle = match self.config.connect_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, connecting)
                .await
                .map_err(|_| SshError::Timeout("Connection timed out".to_string()))??,
            None => connecting.await?,
        };

        debug!("SSH handshake completed");

        let authenticated = match &self.config.auth {
            AuthMethod::Password { password } => handle
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?,
            AuthMethod::Key {
                key_path,
                passphrase,
            } => {
                let key = russh::keys::load_secret_key(key_path, passphrase.as_deref())
                    .map_err(|e| SshError::KeyError(e.to_string()))?;
                let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key), None);

                handle
                    .authenticate_publickey(&self.config.username, key_with_hash)
                    .await
                    .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
            }
        };

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful for {}@{}", self.config.username, addr);

        let label = format!("{}@{}", self.config.username, addr);
        Ok(spawn_transport_owner(handle, label))
    }
}

/// Client handler for russh callbacks: host key verification only
pub struct ClientHandler {
    host: String,
    port: u16,
    /// - true: reject unknown keys
    /// - false: learn unknown keys (changed keys are always rejected)
    strict: bool,
    known_hosts: KnownHosts,
}

impl ClientHandler {
    pub fn new(host: String, port: u16, strict: bool, known_hosts: KnownHosts) -> Self {
        Self {
            host,
            port,
            strict,
            known_hosts,
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self
            .known_hosts
            .verify(&self.host, self.port, server_public_key)
        {
            HostKeyVerification::Verified => Ok(true),
            HostKeyVerification::Unknown { fingerprint } => {
                if self.strict {
                    warn!(
                        "Unknown host key for {}:{} ({}), strict mode rejects it",
                        self.host, self.port, fingerprint
                    );
                    return Err(SshError::HostKeyRejected(format!(
                        "unknown host {}:{} with fingerprint {}. Add it to {} or disable strict checking.",
                        self.host,
                        self.port,
                        fingerprint,
                        self.known_hosts.path().display()
                    )));
                }

                info!(
                    "New host {}:{}, adding to known_hosts (fingerprint: {})",
                    self.host, self.port, fingerprint
                );
                if let Err(e) = self
                    .known_hosts
                    .learn(&self.host, self.port, server_public_key)
                {
                    warn!("Failed to save host key: {}", e);
                }
                Ok(true)
            }
            HostKeyVerification::Changed { line, fingerprint } => {
                warn!(
                    "HOST KEY CHANGED for {}:{} (now {}), possible MITM",
                    self.host, self.port, fingerprint
                );
                Err(SshError::HostKeyRejected(format!(
                    "key for {}:{} does not match {} line {}. Actual fingerprint: {}. \
                     Remove the stale entry if the change is legitimate.",
                    self.host,
                    self.port,
                    self.known_hosts.path().display(),
                    line,
                    fingerprint
                )))
            }
        }
    }
}
