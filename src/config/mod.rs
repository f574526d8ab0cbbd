//! Configuration Management Module
//!
//! Persistent settings for the session manager and its SSH front end, plus
//! the override → environment → default resolution of remote server paths.

pub mod resolve;
pub mod storage;
pub mod types;

pub use resolve::{ServerSettings, DEFAULT_SERVER_DIR, SERVER_ARGS_ENV, SERVER_DIR_ENV};
pub use storage::{config_dir, config_file, ConfigStorage, StorageError};
pub use types::{ConfigFile, SessionManagerConfig, SshDefaults, CONFIG_VERSION};
