//! Configuration file for the `boardsync` binary.

use boardsync_core::{Color, Error, Result};
use boardsync_game::{GameConfig, UciEngineConfig};
use boardsync_hardware::BoardConfig;
use serde::{Deserialize, Serialize};

/// Who sits at one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeatConfig {
    /// Moves are read from the physical board.
    Human { name: String },

    /// Moves come from a pool of UCI engines taking turns.
    Engine { engines: Vec<UciEngineConfig> },
}

impl SeatConfig {
    fn validate(&self, color: Color) -> Result<()> {
        match self {
            SeatConfig::Human { name } if name.trim().is_empty() => {
                Err(Error::Config(format!("{color}: player name must not be empty")))
            }
            SeatConfig::Human { .. } => Ok(()),
            SeatConfig::Engine { engines } if engines.is_empty() => {
                Err(Error::Config(format!("{color}: engine seat needs at least one engine")))
            }
            SeatConfig::Engine { engines } => engines.iter().try_for_each(UciEngineConfig::validate),
        }
    }
}

/// Whole application configuration.
///
/// Every section is optional; a missing file means a human playing white
/// against `stockfish` on `/dev/ttyUSB0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub game: GameConfig,
    pub white: SeatConfig,
    pub black: SeatConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            game: GameConfig::default(),
            white: SeatConfig::Human {
                name: "white".to_string(),
            },
            black: SeatConfig::Engine {
                engines: vec![UciEngineConfig::default()],
            },
        }
    }
}

impl AppConfig {
    /// # Errors
    /// Returns `Error::Config` for the first invalid section.
    pub fn validate(&self) -> Result<()> {
        self.board.validate()?;
        self.game.validate()?;
        self.white.validate(Color::White)?;
        self.black.validate(Color::Black)
    }
}
