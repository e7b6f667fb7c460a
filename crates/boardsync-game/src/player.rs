//! Players: where each side's moves come from.
//!
//! A human's moves are read off the physical board through a
//! [`MoveInbox`](crate::inbox::MoveInbox). An engine's moves come from an
//! [`EngineAdapter`] and still have to be carried out on the board by hand;
//! the controller waits for that separately.
//!
//! [`Player`] wraps both behind [`MoveSource`] with enum dispatch.

#![allow(async_fn_in_trait)]

use crate::{
    engine::{Engine, EngineAdapter},
    error::{GameError, Result},
    inbox::{InboxHandle, InterruptToken, Resolution},
    rules::MoveRequest,
};
use boardsync_core::Color;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Who is behind a move source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Engine,
}

/// A player's answer to "your turn".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    Move(MoveRequest),
    Interrupted(InterruptToken),
}

/// Source of moves for one color.
pub trait MoveSource {
    fn name(&self) -> String;

    fn kind(&self) -> PlayerKind;

    fn color(&self) -> Color;

    /// Produce a move for the position in `fen`.
    ///
    /// `retry` is set when the previous answer for this turn was illegal.
    async fn your_turn(&mut self, fen: &str, retry: bool) -> Result<TurnAction>;
}

/// Player moving pieces on the board.
#[derive(Debug, Clone)]
pub struct HumanPlayer {
    name: String,
    inbox: InboxHandle,
}

impl HumanPlayer {
    pub fn new(name: impl Into<String>, inbox: InboxHandle) -> Self {
        Self {
            name: name.into(),
            inbox,
        }
    }

    pub fn inbox(&self) -> &InboxHandle {
        &self.inbox
    }
}

impl MoveSource for HumanPlayer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Human
    }

    fn color(&self) -> Color {
        self.inbox.color()
    }

    async fn your_turn(&mut self, _fen: &str, retry: bool) -> Result<TurnAction> {
        debug!(player = %self.name, retry, "Waiting for a move on the board");
        match self.inbox.next_move().await? {
            Resolution::Move(mv) => Ok(TurnAction::Move(MoveRequest::from(&mv))),
            Resolution::Interrupted(token) => Ok(TurnAction::Interrupted(token)),
        }
    }
}

/// Player backed by a pool of engines.
#[derive(Debug)]
pub struct EnginePlayer<E> {
    color: Color,
    adapter: EngineAdapter<E>,
}

impl<E: Engine> EnginePlayer<E> {
    pub fn new(color: Color, adapter: EngineAdapter<E>) -> Self {
        Self { color, adapter }
    }

    pub fn adapter(&self) -> &EngineAdapter<E> {
        &self.adapter
    }

    pub fn take_back(&mut self) {
        self.adapter.take_back();
    }
}

impl<E: Engine> MoveSource for EnginePlayer<E> {
    fn name(&self) -> String {
        format!("engine {}", self.adapter.name())
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Engine
    }

    fn color(&self) -> Color {
        self.color
    }

    async fn your_turn(&mut self, fen: &str, retry: bool) -> Result<TurnAction> {
        let answer = self.adapter.best_move(fen, retry).await?;
        info!(engine = %answer.engine, best_move = %answer.result.best_move, "Engine moved");

        let request = answer
            .result
            .best_move
            .parse::<MoveRequest>()
            .map_err(|source| GameError::EngineIllegalMove {
                engine: answer.engine.clone(),
                uci: answer.result.best_move.clone(),
                source,
            })?;
        Ok(TurnAction::Move(request))
    }
}

/// Either kind of player.
#[derive(Debug)]
pub enum Player<E> {
    Human(HumanPlayer),
    Engine(EnginePlayer<E>),
}

impl<E: Engine> Player<E> {
    pub fn human(name: impl Into<String>, inbox: InboxHandle) -> Self {
        Self::Human(HumanPlayer::new(name, inbox))
    }

    pub fn engine(color: Color, adapter: EngineAdapter<E>) -> Self {
        Self::Engine(EnginePlayer::new(color, adapter))
    }

    /// Inbox of a human player.
    pub fn inbox(&self) -> Option<&InboxHandle> {
        match self {
            Self::Human(player) => Some(player.inbox()),
            Self::Engine(_) => None,
        }
    }

    /// Undo the engine rotation of the last turn. No-op for humans.
    pub fn take_back(&mut self) {
        if let Self::Engine(player) = self {
            player.take_back();
        }
    }
}

impl<E: Engine> MoveSource for Player<E> {
    fn name(&self) -> String {
        match self {
            Self::Human(player) => player.name(),
            Self::Engine(player) => player.name(),
        }
    }

    fn kind(&self) -> PlayerKind {
        match self {
            Self::Human(player) => player.kind(),
            Self::Engine(player) => player.kind(),
        }
    }

    fn color(&self) -> Color {
        match self {
            Self::Human(player) => player.color(),
            Self::Engine(player) => player.color(),
        }
    }

    async fn your_turn(&mut self, fen: &str, retry: bool) -> Result<TurnAction> {
        match self {
            Self::Human(player) => player.your_turn(fen, retry).await,
            Self::Engine(player) => player.your_turn(fen, retry).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchBudget;
    use crate::mock::MockEngine;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn engine_player(moves: &[&str]) -> Player<MockEngine> {
        let (engine, _handle) = MockEngine::scripted("mock", moves.iter().copied());
        let adapter = EngineAdapter::new(vec![engine], SearchBudget::default()).unwrap();
        Player::engine(Color::White, adapter)
    }

    #[tokio::test]
    async fn test_engine_player_returns_request() {
        let mut player = engine_player(&["e2e4"]);
        assert_eq!(player.kind(), PlayerKind::Engine);
        assert_eq!(player.name(), "engine mock");
        assert!(player.inbox().is_none());

        let action = player.your_turn(FEN, false).await.unwrap();
        assert_eq!(action, TurnAction::Move("e2e4".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_engine_garbage_is_fatal() {
        let mut player = engine_player(&["(none)"]);
        let err = player.your_turn(FEN, false).await.unwrap_err();
        assert!(matches!(err, GameError::EngineIllegalMove { .. }));
        assert!(err.is_fatal());
    }
}
