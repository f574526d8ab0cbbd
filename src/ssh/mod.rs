//! SSH module - the transport the session manager runs its commands over
//!
//! # Features
//! - Password and private key authentication
//! - Host key verification via ~/.ssh/known_hosts
//! - Single owner task per connection (see `handle_owner`)
//! - Exec channels adapted to `session_manager::ExecTransport`

mod client;
mod config;
mod error;
mod exec;
mod handle_owner;
pub mod known_hosts;

pub use client::{ClientHandler, SshClient};
pub use config::{parse_server_name, AuthMethod, ServerName, SshConfig};
pub use error::SshError;
pub use exec::RusshExecChannel;
pub use handle_owner::{spawn_transport_owner, TransportCommand, TransportController};
pub use known_hosts::{HostKeyVerification, KnownHosts};
