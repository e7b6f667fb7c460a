//! Events published by the game controller.

use crate::{
    inbox::InterruptToken,
    rules::{AppliedMove, MoveRequest, Terminal},
};
use boardsync_core::{Color, Snapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The physical board does not show the starting position yet.
    WaitingForStart { board: Snapshot },

    /// Board and rules are at the starting position; play begins.
    Ready { fen: String },

    /// A human made a move the rules reject. The same color moves again.
    IllegalMove {
        color: Color,
        player: String,
        request: MoveRequest,
    },

    /// A legal move was accepted but the board does not show it yet.
    WaitingBoardSync { mv: AppliedMove, before: Snapshot },

    /// The board changed but still does not match the accepted move.
    NotSynced { board: Snapshot, before: Snapshot },

    /// A move was accepted and the board matches it.
    PlayerMoved {
        player: String,
        mv: AppliedMove,
        fen: String,
    },

    GameOver { result: Terminal },
}

impl GameEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::WaitingForStart { .. } => "waiting_for_start",
            GameEvent::Ready { .. } => "ready",
            GameEvent::IllegalMove { .. } => "illegal_move",
            GameEvent::WaitingBoardSync { .. } => "waiting_board_sync",
            GameEvent::NotSynced { .. } => "not_synced",
            GameEvent::PlayerMoved { .. } => "player_moved",
            GameEvent::GameOver { .. } => "game_over",
        }
    }
}

/// Why [`GameController::play`](crate::GameController::play) returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "end", rename_all = "snake_case")]
pub enum GameEnd {
    Finished { result: Terminal },
    Interrupted { token: InterruptToken },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_over_serializes_result() {
        let event = GameEvent::GameOver {
            result: Terminal::Checkmate {
                winner: Color::Black,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "game_over");
        assert_eq!(json["result"]["kind"], "checkmate");
        assert_eq!(json["result"]["winner"], "black");
        assert_eq!(event.name(), "game_over");
    }

    #[test]
    fn test_illegal_move_serializes_request() {
        let event = GameEvent::IllegalMove {
            color: Color::White,
            player: "alice".to_string(),
            request: "e2e5".parse().unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["color"], "white");
        assert_eq!(json["request"]["promotion"], serde_json::Value::Null);
    }
}
