//! Error types for game synchronization.
//!
//! Three layers fail independently: the rules delegate ([`RulesError`]), the
//! engines ([`EngineError`]) and the controller that ties them to the board
//! ([`GameError`]). Lower layers convert into `GameError` with `?`.

use boardsync_core::Color;
use boardsync_hardware::HardwareError;

/// Result type alias for game operations.
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised by the chess rules delegate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// Position string could not be parsed or describes an impossible position.
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    /// Move string is not well-formed UCI.
    #[error("Invalid move notation: {0}")]
    InvalidNotation(String),

    /// Move is well-formed but not legal in the current position.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

impl RulesError {
    /// Whether the error is about the move itself, as opposed to the position.
    pub fn is_rejected_move(&self) -> bool {
        matches!(
            self,
            RulesError::InvalidNotation(_) | RulesError::IllegalMove(_)
        )
    }
}

/// Errors raised by chess engines and the engine adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Adapter built with an empty pool.
    #[error("Engine pool is empty")]
    NoEngines,

    /// Engine stopped responding.
    #[error("Engine disconnected: {name}")]
    Disconnected { name: String },

    /// Engine reported a failure.
    #[error("Engine {name} failed: {message}")]
    Failed { name: String, message: String },
}

impl EngineError {
    pub fn disconnected(name: impl Into<String>) -> Self {
        Self::Disconnected { name: name.into() }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the game controller and players.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// An engine proposed a move the rules reject. Never retried.
    #[error("Engine {engine} proposed an illegal move {uci}: {source}")]
    EngineIllegalMove {
        engine: String,
        uci: String,
        #[source]
        source: RulesError,
    },

    /// The move inbox of a color stopped.
    #[error("Move inbox for {color} closed")]
    InboxClosed { color: Color },

    /// A game operation was called before `new_game`.
    #[error("No game in progress")]
    NoGame,

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Board(#[from] boardsync_core::Error),
}

impl GameError {
    pub fn inbox_closed(color: Color) -> Self {
        Self::InboxClosed { color }
    }

    /// Whether the game cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GameError::Rules(e) if e.is_rejected_move())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_illegal_move_is_fatal() {
        let err = GameError::EngineIllegalMove {
            engine: "mock".to_string(),
            uci: "e2e5".to_string(),
            source: RulesError::IllegalMove("e2e5".to_string()),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("e2e5"));
    }

    #[test]
    fn test_rejected_move_is_not_fatal() {
        let err: GameError = RulesError::IllegalMove("a1a8".to_string()).into();
        assert!(!err.is_fatal());

        let err: GameError = RulesError::InvalidFen("x".to_string()).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_hardware_error_converts() {
        let err: GameError = HardwareError::disconnected("board task").into();
        assert!(matches!(err, GameError::Hardware(_)));
        assert!(err.is_fatal());
    }
}
