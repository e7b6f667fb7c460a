//! `boardsync`: play a game on a sensor board against UCI engines.
//!
//! Run with: `boardsync [config.json]`. Game events are printed to stdout as
//! JSON lines; logs go to stderr and follow `RUST_LOG`.

mod config;

use anyhow::Context;
use boardsync_core::Color;
use boardsync_game::{
    EngineAdapter, GameController, GameEvent, InboxHandle, InterruptToken, MoveInbox, Player,
    UciEngine,
};
use boardsync_hardware::{Board, BoardHandle, SerialTransport};
use config::{AppConfig, SeatConfig};
use futures::future::try_join_all;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("boardsync_cli=info".parse()?)
                .add_directive("boardsync_game=info".parse()?)
                .add_directive("boardsync_hardware=info".parse()?),
        )
        .init();

    let config = load_config(std::env::args().nth(1)).await?;
    config.validate()?;

    let transport = SerialTransport::open(&config.board)
        .with_context(|| format!("opening {}", config.board.port))?;
    let board = Board::spawn(transport, config.board.clone())?;
    let device = board.wait_ready().await?;
    info!(
        serial = ?device.serial_number,
        firmware = ?device.firmware_version,
        "Board connected on {}",
        device.name
    );

    let budget = config.game.search;
    let white = seat(Color::White, &config.white, &board, budget).await?;
    let black = seat(Color::Black, &config.black, &board, budget).await?;
    let inboxes: Vec<InboxHandle> = [&white, &black]
        .into_iter()
        .filter_map(|player| player.inbox().cloned())
        .collect();

    let mut game = GameController::new(board, config.game.clone())?;
    tokio::spawn(print_events(game.subscribe()));
    if !inboxes.is_empty() {
        tokio::spawn(interrupt_on_ctrl_c(inboxes));
    }

    game.new_game(white, black).await?;
    let end = game.play().await?;
    info!(?end, fen = %game.fen(), "Game ended");
    println!("{}", serde_json::to_string(&end)?);
    Ok(())
}

async fn load_config(path: Option<String>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(AppConfig::default());
    };
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

async fn seat(
    color: Color,
    config: &SeatConfig,
    board: &BoardHandle,
    budget: boardsync_game::SearchBudget,
) -> anyhow::Result<Player<UciEngine>> {
    match config {
        SeatConfig::Human { name } => Ok(Player::human(name, MoveInbox::spawn(color, board))),
        SeatConfig::Engine { engines } => {
            let engines = try_join_all(engines.iter().map(UciEngine::spawn)).await?;
            Ok(Player::engine(color, EngineAdapter::new(engines, budget)?))
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<GameEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Cannot serialize {}: {e}", event.name()),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Ctrl-C ends the game at the next human turn.
async fn interrupt_on_ctrl_c(inboxes: Vec<InboxHandle>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Interrupt requested");
    for inbox in inboxes {
        if let Err(e) = inbox.interrupt(InterruptToken::new("ctrl-c")).await {
            warn!(color = %inbox.color(), "Cannot interrupt: {e}");
        }
    }
}
