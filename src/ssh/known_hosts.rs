//! Known hosts verification for the session manager transport
//!
//! Thin layer over russh's OpenSSH `known_hosts` support that turns its
//! bool/error answers into a verification verdict.

use std::path::{Path, PathBuf};

use russh::keys::{HashAlg, PublicKey};
use tracing::{debug, info, warn};

use super::error::SshError;

/// Result of host key verification
#[derive(Debug, Clone, PartialEq)]
pub enum HostKeyVerification {
    /// Key matches known_hosts entry
    Verified,
    /// Host not in known_hosts (first connection)
    Unknown { fingerprint: String },
    /// Key changed from known_hosts entry (potential MITM)
    Changed { line: usize, fingerprint: String },
}

/// Known hosts file wrapper
#[derive(Debug, Clone)]
pub struct KnownHosts {
    path: PathBuf,
}

impl KnownHosts {
    /// Use `~/.ssh/known_hosts`
    pub fn user_default() -> Self {
        let path = dirs::home_dir()
            .map(|h| h.join(".ssh").join("known_hosts"))
            .unwrap_or_else(|| PathBuf::from(".ssh/known_hosts"));
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA256 fingerprint in OpenSSH notation
    pub fn fingerprint(key: &PublicKey) -> String {
        key.fingerprint(HashAlg::Sha256).to_string()
    }

    /// Check a server key against the file
    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyVerification {
        let fingerprint = Self::fingerprint(key);
        match russh::keys::check_known_hosts_path(host, port, key, &self.path) {
            Ok(true) => {
                debug!("Host key verified for {}:{}", host, port);
                HostKeyVerification::Verified
            }
            Ok(false) => HostKeyVerification::Unknown { fingerprint },
            Err(russh::keys::Error::KeyChanged { line }) => {
                warn!(
                    "Host key for {}:{} differs from {}:{}",
                    host,
                    port,
                    self.path.display(),
                    line
                );
                HostKeyVerification::Changed { line, fingerprint }
            }
            Err(e) => {
                // Unreadable entries are treated like a missing entry
                warn!("Failed to read {}: {}", self.path.display(), e);
                HostKeyVerification::Unknown { fingerprint }
            }
        }
    }

    /// Append a host key
    pub fn learn(&self, host: &str, port: u16, key: &PublicKey) -> Result<(), SshError> {
        russh::keys::known_hosts::learn_known_hosts_path(host, port, key, &self.path)?;
        info!(
            "Added host key for {}:{} to {}",
            host,
            port,
            self.path.display()
        );
        Ok(())
    }
}
