//! Command-line interface for guessnum.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Guess the four-digit number, alone or against a friend
#[derive(Parser, Debug)]
#[command(name = "guessnum")]
#[command(about = "Bulls-and-cows style number guessing over a shared session service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = "guessnum.toml")]
    pub config: PathBuf,

    /// Session service URL, overriding config and environment
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Log file for play modes
    #[arg(long, global = true, default_value = "guessnum.log")]
    pub log_file: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the session service
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Open a room and let someone guess your number
    Host {
        /// Your display name
        #[arg(short, long)]
        name: String,

        /// Four distinct digits for the opponent to find
        #[arg(short, long)]
        secret: String,
    },

    /// Join a room and guess the host's number
    Join {
        /// Room code shared by the host
        #[arg(short, long)]
        code: String,

        /// Your display name
        #[arg(short, long)]
        name: String,
    },

    /// Guess a number picked by the computer
    Solo {
        /// Your display name
        #[arg(short, long)]
        name: String,

        /// Play without a session service
        #[arg(long)]
        offline: bool,
    },
}
