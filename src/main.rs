//! Patricians - console client
//!
//! Connects to a Patricians backend and plays from the terminal.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, ConnectionArgs};
use patricians::{
    ClientConfig, ClientEvent, ConsolePrompter, ConsoleScreen, GameController, HttpGameClient,
    closed_lines, parse_seat, render_board, run_console, spawn_stdin_reader,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { log_file } => run_play(&cli.connection, &log_file).await,
        Command::Status => {
            init_stderr_tracing();
            run_status(&cli.connection).await
        }
        Command::Reset => {
            init_stderr_tracing();
            run_reset(&cli.connection).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Loads config and applies command-line overrides.
#[instrument(skip_all)]
fn load_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(url) = &args.server_url {
        info!(%url, "Overriding server URL");
        config = config.with_server_url(url.clone());
    }
    if let Some(seat) = &args.seat {
        config = config.with_seat(Some(parse_seat(seat)?));
    }
    Ok(config)
}

fn build_controller(
    config: &ClientConfig,
    prompter: ConsolePrompter,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
) -> Result<GameController> {
    let api = Arc::new(HttpGameClient::from_config(config)?);
    Ok(GameController::new(*config.seat(), api, Box::new(prompter), event_tx))
}

/// Run the interactive console
async fn run_play(args: &ConnectionArgs, log_file: &Path) -> Result<()> {
    // Log to a file so tracing output does not interleave with the board
    let log_file = std::fs::File::create(log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    let config = load_config(args)?;
    info!(server_url = %config.server_url(), seat = ?config.seat(), "Starting console client");

    let lines = spawn_stdin_reader();
    let (event_tx, events) = mpsc::unbounded_channel();
    let screen = ConsoleScreen::new(events).shared();
    let prompter = ConsolePrompter::new(lines.clone()).with_screen(Arc::clone(&screen));
    let controller = build_controller(&config, prompter, event_tx)?;
    run_console(
        controller,
        screen,
        lines,
        Duration::from_millis(*config.poll_interval_ms()),
    )
    .await
}

/// Print the board once
async fn run_status(args: &ConnectionArgs) -> Result<()> {
    let config = load_config(args)?;
    let (event_tx, _events) = mpsc::unbounded_channel();
    let mut controller =
        build_controller(&config, ConsolePrompter::new(closed_lines()), event_tx)?;
    controller.refresh().await?;
    println!("{}", render_board(&controller.view()));
    Ok(())
}

/// Reset the game on the server
async fn run_reset(args: &ConnectionArgs) -> Result<()> {
    let config = load_config(args)?;
    let (event_tx, _events) = mpsc::unbounded_channel();
    let mut controller =
        build_controller(&config, ConsolePrompter::new(closed_lines()), event_tx)?;
    controller.reset().await?;
    println!("Game has been reset");
    println!("{}", render_board(&controller.view()));
    Ok(())
}
