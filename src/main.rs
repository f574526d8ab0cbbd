use anyhow::Context;
use clap::Parser;
use tracing::error;

use tvnc_session_lib::cli::Cli;
use tvnc_session_lib::config::ConfigStorage;
use tvnc_session_lib::picker::TerminalPicker;
use tvnc_session_lib::session_manager::{
    Collaborators, CredentialSlot, ErrorSuppression, SessionManager, SessionOutcome,
};
use tvnc_session_lib::ssh::SshClient;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tvnc_session_lib::init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the user cancelled
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let storage = match &cli.config {
        Some(path) => ConfigStorage::with_path(path.clone()),
        None => ConfigStorage::new()?,
    };
    let file = storage
        .load()
        .await
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;
    let config = cli.apply(file);

    let settings = cli.server_settings(&config);
    let ssh_config = cli.ssh_config(&config, |key| std::env::var(key).ok())?;
    let host = ssh_config.host.clone();

    let transport = SshClient::new(ssh_config)
        .connect()
        .await
        .with_context(|| format!("Could not connect to {}", host))?;

    let picker = TerminalPicker::stdio();
    let credentials = CredentialSlot::new();
    let errors = ErrorSuppression::new();
    let manager = SessionManager::new(
        &transport,
        host,
        &settings,
        Collaborators {
            picker: &picker,
            credentials: &credentials,
            errors: &errors,
        },
    );

    let outcome = manager.create_session().await;
    transport.disconnect().await;

    match outcome? {
        outcome @ SessionOutcome::Connect { .. } => {
            if let Some(target) = outcome.connect_target() {
                println!("{}", target);
            }
            if let Some(otp) = credentials.take() {
                println!("{}", otp.expose());
            }
            Ok(true)
        }
        SessionOutcome::Cancelled => Ok(false),
    }
}
