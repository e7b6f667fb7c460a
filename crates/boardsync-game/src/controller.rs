//! Game controller: keeps the rules and the physical board in step.
//!
//! # Turn Flow
//!
//! ```text
//! your_turn(color) ──► rules.play ──illegal, human──► IllegalMove, ask again
//!                          │        ──illegal, engine─► fatal error
//!                          ▼
//!                 board shows color's pieces as the rules do?
//!                   │ no: WaitingBoardSync, watch Changed events,
//!                   │     NotSynced after each quiet grace period
//!                   ▼ yes
//!                 commit overlay ─► PlayerMoved ─► terminal? ─► GameOver
//! ```
//!
//! Only the mover's pieces are compared, so the other side may already be
//! reaching for its next move while this one is being synced.

use crate::{
    config::GameConfig,
    engine::Engine,
    error::{GameError, Result},
    events::{GameEnd, GameEvent},
    player::{MoveSource, Player, PlayerKind, TurnAction},
    rules::{AppliedMove, Rules, ShakmatyRules},
};
use boardsync_core::{Color, Snapshot};
use boardsync_hardware::{BoardEvent, BoardHandle, HardwareError};
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// The two seats of a game.
#[derive(Debug)]
struct Seats<E> {
    white: Player<E>,
    black: Player<E>,
}

impl<E> Seats<E> {
    fn get(&self, color: Color) -> &Player<E> {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn get_mut(&mut self, color: Color) -> &mut Player<E> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

/// Drives one game at a time on one board.
///
/// # Examples
///
/// ```no_run
/// use boardsync_game::{GameConfig, GameController, Player, inbox::MoveInbox, mock::MockEngine};
/// use boardsync_game::{EngineAdapter, SearchBudget};
/// use boardsync_core::Color;
/// use boardsync_hardware::{Board, BoardConfig, SerialTransport};
///
/// # async fn example() -> boardsync_game::Result<()> {
/// let config = BoardConfig::with_port("/dev/ttyUSB0");
/// let board = Board::spawn(SerialTransport::open(&config)?, config)?;
/// board.wait_ready().await?;
///
/// let (engine, _script) = MockEngine::new("mock");
/// let white = Player::human("you", MoveInbox::spawn(Color::White, &board));
/// let black = Player::engine(
///     Color::Black,
///     EngineAdapter::new(vec![engine], SearchBudget::default())?,
/// );
///
/// let mut game = GameController::new(board, GameConfig::default())?;
/// game.new_game(white, black).await?;
/// let end = game.play().await?;
/// println!("{end:?}");
/// # Ok(())
/// # }
/// ```
pub struct GameController<E, R = ShakmatyRules> {
    board: BoardHandle,
    rules: R,
    config: GameConfig,
    seats: Option<Seats<E>>,
    events: broadcast::Sender<GameEvent>,
}

impl<E: Engine> GameController<E, ShakmatyRules> {
    /// Controller using the `shakmaty` rules.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid.
    pub fn new(board: BoardHandle, config: GameConfig) -> Result<Self> {
        Self::with_rules(board, ShakmatyRules::new(), config)
    }
}

impl<E: Engine, R: Rules> GameController<E, R> {
    /// # Errors
    /// Returns an error if `config` is invalid.
    pub fn with_rules(board: BoardHandle, rules: R, config: GameConfig) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            board,
            rules,
            config,
            seats: None,
            events,
        })
    }

    /// Subscribe to game events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn turn(&self) -> Color {
        self.rules.turn()
    }

    pub fn fen(&self) -> String {
        self.rules.fen()
    }

    /// Player seated at `color`, once a game has started.
    pub fn player(&self, color: Color) -> Option<&Player<E>> {
        self.seats.as_ref().map(|seats| seats.get(color))
    }

    /// Wait for the board to show the starting position, then start a game.
    ///
    /// There is no timeout: this returns only once the physical board
    /// matches, emitting `WaitingForStart` after every mismatching change.
    ///
    /// # Errors
    /// Returns an error if a player sits at the wrong color, the board task
    /// stops, or the starting position is rejected by the rules.
    pub async fn new_game(&mut self, white: Player<E>, black: Player<E>) -> Result<()> {
        if white.color() != Color::White || black.color() != Color::Black {
            return Err(boardsync_core::Error::Config(
                "players must be seated at their own color".to_string(),
            )
            .into());
        }

        let start = self.config.start_board()?;
        self.wait_for_start(&start).await?;

        self.board.reset().await?;
        self.rules.load(&self.config.start_fen)?;
        info!(
            white = %white.name(),
            black = %black.name(),
            fen = %self.config.start_fen,
            "New game"
        );
        self.seats = Some(Seats { white, black });
        self.emit(GameEvent::Ready {
            fen: self.rules.fen(),
        });
        Ok(())
    }

    /// Play turns until the game ends or a wait is interrupted.
    ///
    /// # Errors
    /// Returns the first fatal error, such as an illegal engine move.
    pub async fn play(&mut self) -> Result<GameEnd> {
        loop {
            if let Some(end) = self.play_turn().await? {
                return Ok(end);
            }
        }
    }

    /// Play one turn. Returns `Some` once the game is over.
    ///
    /// # Errors
    /// Returns `GameError::NoGame` before [`new_game`](Self::new_game), and
    /// any fatal error raised during the turn.
    pub async fn play_turn(&mut self) -> Result<Option<GameEnd>> {
        if let Some(result) = self.rules.terminal() {
            return Ok(Some(GameEnd::Finished { result }));
        }

        let color = self.rules.turn();
        let before = self.rules.board()?;
        let fen = self.rules.fen();
        debug!(%color, %fen, "Turn");

        let mut retry = false;
        let (name, applied) = loop {
            let seat = self.seats.as_mut().ok_or(GameError::NoGame)?.get_mut(color);
            let action = seat.your_turn(&fen, retry).await?;
            let (name, kind) = (seat.name(), seat.kind());

            let request = match action {
                TurnAction::Move(request) => request,
                TurnAction::Interrupted(token) => {
                    info!(%color, %token, "Turn interrupted");
                    return Ok(Some(GameEnd::Interrupted { token }));
                }
            };

            match self.rules.play(&request) {
                Ok(applied) => break (name, applied),
                Err(e) if e.is_rejected_move() && kind == PlayerKind::Human => {
                    warn!(player = %name, %request, "Illegal move, try again");
                    self.emit(GameEvent::IllegalMove {
                        color,
                        player: name,
                        request,
                    });
                    retry = true;
                }
                Err(source) if source.is_rejected_move() => {
                    return Err(GameError::EngineIllegalMove {
                        engine: name,
                        uci: request.uci(),
                        source,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        };
        info!(player = %name, mv = %applied, "Move accepted");

        let inbox = self
            .seats
            .as_ref()
            .and_then(|seats| seats.get(color).inbox().cloned());
        if let Some(inbox) = &inbox {
            inbox.pause().await?;
        }
        self.sync_board(&applied, &before).await?;
        if let Some(inbox) = &inbox {
            inbox.resume().await?;
        }

        self.emit(GameEvent::PlayerMoved {
            player: name,
            mv: applied,
            fen: self.rules.fen(),
        });

        match self.rules.terminal() {
            Some(result) => {
                info!(%result, "Game over");
                self.emit(GameEvent::GameOver { result });
                Ok(Some(GameEnd::Finished { result }))
            }
            None => Ok(None),
        }
    }

    async fn wait_for_start(&self, start: &Snapshot) -> Result<()> {
        let mut events = self.board.subscribe();
        let mut live = self.board.snapshot().await?;

        while live != *start {
            debug!(board = %live, "Waiting for start position");
            self.emit(GameEvent::WaitingForStart { board: live });
            live = next_change(&mut events, &self.board).await?;
        }
        info!("Board in start position");
        Ok(())
    }

    /// Block until the mover's pieces on the board match the rules, then
    /// commit them as confirmed.
    async fn sync_board(&self, mv: &AppliedMove, before: &Snapshot) -> Result<()> {
        let color = mv.color;
        let expected = self.rules.board()?.project(color);
        let captured = mv.en_passant_square();
        let in_sync = |live: &Snapshot| {
            live.project(color) == expected && captured.is_none_or(|sq| live.get(sq).is_empty())
        };

        let mut events = self.board.subscribe();
        let mut live = self.board.snapshot().await?;

        if !in_sync(&live) {
            info!(mv = %mv, "Waiting for board to match move");
            for line in expected.ascii() {
                debug!("{line}");
            }
            self.emit(GameEvent::WaitingBoardSync {
                mv: mv.clone(),
                before: *before,
            });

            let grace = self.config.sync_grace(mv.castling.is_some());
            let mut deadline = Some(Instant::now() + grace);
            loop {
                tokio::select! {
                    changed = next_change(&mut events, &self.board) => {
                        live = changed?;
                        if in_sync(&live) {
                            break;
                        }
                        deadline = Some(Instant::now() + grace);
                    }
                    _ = sleep_until_some(deadline) => {
                        deadline = None;
                        if live != *before {
                            warn!(board = %live, "Board change does not match move {mv}");
                            self.emit(GameEvent::NotSynced {
                                board: live,
                                before: *before,
                            });
                        }
                    }
                }
            }
        }

        debug!(%color, "Board in sync, committing");
        self.board.commit(color, expected, captured).await?;
        Ok(())
    }

    fn emit(&self, event: GameEvent) {
        debug!(event = event.name(), "Game event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Next live snapshot published by the board.
async fn next_change(
    events: &mut broadcast::Receiver<BoardEvent>,
    board: &BoardHandle,
) -> Result<Snapshot> {
    loop {
        match events.recv().await {
            Ok(BoardEvent::Changed { board }) => return Ok(board),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Game controller lagged behind board events");
                return Ok(board.snapshot().await?);
            }
            Err(broadcast::error::RecvError::Closed) => {
                return Err(HardwareError::disconnected("board task").into());
            }
        }
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
