//! guessnum - unified CLI
//!
//! Runs the session service or plays a game in the terminal.

#![warn(missing_docs)]

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use guessnum::{ClientConfig, GameClient, LocalSession, RemoteSession, SessionBackend, console};
use guessnum_server::ServerConfig;
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => run_server(&cli.config, host, port).await,
        command => {
            init_file_tracing(&cli.log_file)?;
            play(&cli.config, cli.server_url, command).await
        }
    }
}

/// Run the session service
async fn run_server(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,guessnum_server=debug")),
        )
        .init();

    let config = ServerConfig::load(Some(config_path))?;
    let host = host.unwrap_or_else(|| config.host().clone());
    let port = port.unwrap_or(*config.port());
    let config = config.with_bind(host, port);

    info!(host = %config.host(), port = config.port(), "Starting guessnum session service");
    guessnum_server::run(config)
        .await
        .context("Session service stopped")
}

/// Play modes log to a file so log lines stay out of the game display.
fn init_file_tracing(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

#[instrument(skip_all)]
async fn play(config_path: &Path, server_url: Option<String>, command: Command) -> Result<()> {
    let mut config = ClientConfig::load(Some(config_path))?;
    if let Some(url) = server_url {
        config = config.with_server_url(url);
    }
    info!(server_url = %config.server_url(), "Starting guessnum client");

    let backend: Arc<dyn SessionBackend> = match &command {
        Command::Solo { offline: true, .. } => Arc::new(LocalSession::new()),
        _ => Arc::new(RemoteSession::from_config(&config)?),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut client = GameClient::new(backend, config.poll_interval(), event_tx);

    match command {
        Command::Host { name, secret } => {
            let code = client.create_game(&name, &secret).await?;
            println!("Room code: {}. Share it with your opponent.", code);
            println!("Type 'leave' to close the room.");
        }
        Command::Join { code, name } => {
            let host = client.join_game(&code, &name).await?;
            println!("Joined {}'s room {}. Find the four distinct digits.", host, code.trim().to_uppercase());
        }
        Command::Solo { name, offline } => {
            client.start_single_player(&name).await?;
            let place = if offline { "offline" } else { "on the server" };
            println!("New game {}. Find the four distinct digits.", place);
        }
        Command::Serve { .. } => anyhow::bail!("serve is not a play mode"),
    }

    console::run(client, event_rx).await
}
