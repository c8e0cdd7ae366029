//! Command-line interface for the patricians client.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Patricians - console client for Caesar & Cleopatra
#[derive(Parser, Debug)]
#[command(name = "patricians")]
#[command(about = "Console client for the Patricians card game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Connection options shared by every subcommand
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Options overriding the loaded configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Seat to play (CAESAR or CLEOPATRA); omit for hot-seat play
    #[arg(long, global = true)]
    pub seat: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play interactively in the terminal
    Play {
        /// Log file for tracing output
        #[arg(long, default_value = "patricians.log")]
        log_file: PathBuf,
    },

    /// Print the current board once and exit
    Status,

    /// Reset the game on the server
    Reset,
}
