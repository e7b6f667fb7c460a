//! Per-color move inbox.
//!
//! A [`MoveInbox`] task subscribes to the board and collects the move events
//! of one color, whether or not anybody is waiting for them. A waiter gets a
//! completion token that resolves exactly once, either with a move or with
//! an interrupt.
//!
//! # Rules
//!
//! - A move arriving while a wait is outstanding resolves it.
//! - A move arriving with no wait outstanding is queued.
//! - Starting a wait with a non-empty queue drops the queue as stale and asks
//!   the board to run detection again; a move still on the board will arrive
//!   again through the normal path.
//! - While paused, moves are dropped.
//! - An interrupt resolves the outstanding wait. With no wait outstanding it
//!   is held and resolves the next one, ahead of any queued move.

use crate::error::{GameError, Result};
use boardsync_core::{BoardMove, Color};
use boardsync_hardware::{BoardEvent, BoardHandle};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, trace, warn};

const COMMAND_CAPACITY: usize = 16;

/// Caller-chosen tag carried by an interrupt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterruptToken(pub String);

impl InterruptToken {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl fmt::Display for InterruptToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Move(BoardMove),
    Interrupted(InterruptToken),
}

/// One pending wait. Resolves exactly once.
#[derive(Debug)]
pub struct Completion {
    color: Color,
    rx: oneshot::Receiver<Resolution>,
}

impl Completion {
    /// # Errors
    /// Returns `GameError::InboxClosed` if the inbox stopped, or the wait was
    /// replaced by a newer one.
    pub async fn resolved(self) -> Result<Resolution> {
        self.rx
            .await
            .map_err(|_| GameError::inbox_closed(self.color))
    }
}

#[derive(Debug)]
enum InboxCommand {
    Wait(oneshot::Sender<Resolution>),
    Pause,
    Resume,
    Interrupt(InterruptToken),
}

/// The inbox task for one color.
pub struct MoveInbox {
    color: Color,
    board: BoardHandle,
    pending: VecDeque<BoardMove>,
    waiting: Option<oneshot::Sender<Resolution>>,
    paused: bool,
    held: Option<InterruptToken>,
}

impl MoveInbox {
    /// Subscribe to `board` and start collecting `color`'s moves.
    ///
    /// Events published after this returns are never missed.
    pub fn spawn(color: Color, board: &BoardHandle) -> InboxHandle {
        let events = board.subscribe();
        let (commands, commands_rx) = mpsc::channel(COMMAND_CAPACITY);

        let inbox = MoveInbox {
            color,
            board: board.clone(),
            pending: VecDeque::new(),
            waiting: None,
            paused: false,
            held: None,
        };
        tokio::spawn(inbox.run(events, commands_rx));

        InboxHandle { color, commands }
    }

    async fn run(
        mut self,
        mut events: broadcast::Receiver<BoardEvent>,
        mut commands: mpsc::Receiver<InboxCommand>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(BoardEvent::Move { color, mv }) if color == self.color => self.on_move(mv),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(color = %self.color, skipped, "Move inbox lagged behind board events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },
            }
        }
        debug!(color = %self.color, "Move inbox stopped");
    }

    fn on_move(&mut self, mv: BoardMove) {
        if self.paused {
            trace!(color = %self.color, %mv, "Paused, dropping move");
            return;
        }
        match self.waiting.take() {
            Some(tx) => {
                debug!(color = %self.color, %mv, "Move resolves wait");
                let _ = tx.send(Resolution::Move(mv));
            }
            None => {
                trace!(color = %self.color, %mv, "Queueing move");
                self.pending.push_back(mv);
            }
        }
    }

    async fn on_command(&mut self, command: InboxCommand) {
        match command {
            InboxCommand::Wait(tx) => {
                if let Some(token) = self.held.take() {
                    debug!(color = %self.color, %token, "Held interrupt resolves wait");
                    let _ = tx.send(Resolution::Interrupted(token));
                    return;
                }
                self.waiting = Some(tx);
                if !self.pending.is_empty() {
                    debug!(
                        color = %self.color,
                        stale = self.pending.len(),
                        "Dropping stale moves, re-detecting"
                    );
                    self.pending.clear();
                    if let Err(e) = self.board.redetect().await {
                        warn!(color = %self.color, "Re-detection failed: {e}");
                    }
                }
            }
            InboxCommand::Pause => self.paused = true,
            InboxCommand::Resume => self.paused = false,
            InboxCommand::Interrupt(token) => match self.waiting.take() {
                Some(tx) => {
                    debug!(color = %self.color, %token, "Interrupting wait");
                    let _ = tx.send(Resolution::Interrupted(token));
                }
                None => self.held = Some(token),
            },
        }
    }
}

/// Cloneable handle to a [`MoveInbox`] task.
#[derive(Debug, Clone)]
pub struct InboxHandle {
    color: Color,
    commands: mpsc::Sender<InboxCommand>,
}

impl InboxHandle {
    pub fn color(&self) -> Color {
        self.color
    }

    /// Start waiting for the next move.
    ///
    /// Starting a new wait abandons any earlier one.
    pub async fn wait(&self) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        self.send(InboxCommand::Wait(tx)).await?;
        Ok(Completion {
            color: self.color,
            rx,
        })
    }

    /// Wait for the next move or interrupt.
    pub async fn next_move(&self) -> Result<Resolution> {
        self.wait().await?.resolved().await
    }

    /// Drop moves until [`resume`](Self::resume).
    pub async fn pause(&self) -> Result<()> {
        self.send(InboxCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(InboxCommand::Resume).await
    }

    /// Resolve the outstanding wait, or the next one, with `token`.
    pub async fn interrupt(&self, token: InterruptToken) -> Result<()> {
        self.send(InboxCommand::Interrupt(token)).await
    }

    async fn send(&self, command: InboxCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GameError::inbox_closed(self.color))
    }
}
