//! Game controller configuration.

use boardsync_core::{
    Error, Snapshot,
    constants::{
        CASTLING_EXTRA_GRACE_MS, DEFAULT_EVENT_CAPACITY, DEFAULT_MULTI_PV, DEFAULT_SEARCH_DEPTH,
        DEFAULT_SYNC_GRACE_MS, START_FEN,
    },
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed search budget passed to engines on every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    pub depth: u32,
    pub multi_pv: u32,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            depth: DEFAULT_SEARCH_DEPTH,
            multi_pv: DEFAULT_MULTI_PV,
        }
    }
}

/// Settings for the game controller.
///
/// ```
/// use boardsync_game::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "search": { "depth": 8 } }"#).unwrap();
/// assert_eq!(config.search.depth, 8);
/// assert_eq!(config.search.multi_pv, 5);
/// assert_eq!(config.sync_grace_ms, 1250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Position the physical board must show before play starts.
    pub start_fen: String,

    /// Delay after a failed sync check before reporting the board as not synced.
    pub sync_grace_ms: u64,

    /// Added to the grace delay when the move is a castle.
    pub castling_extra_grace_ms: u64,

    pub search: SearchBudget,

    /// Capacity of the game event broadcast channel.
    pub event_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_fen: START_FEN.to_string(),
            sync_grace_ms: DEFAULT_SYNC_GRACE_MS,
            castling_extra_grace_ms: CASTLING_EXTRA_GRACE_MS,
            search: SearchBudget::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl GameConfig {
    /// Grace delay for a move, longer for castling.
    pub fn sync_grace(&self, castling: bool) -> Duration {
        let extra = if castling {
            self.castling_extra_grace_ms
        } else {
            0
        };
        Duration::from_millis(self.sync_grace_ms + extra)
    }

    /// Physical layout the board must show before play starts.
    ///
    /// # Errors
    /// Returns `Error::InvalidFen` if `start_fen` has no valid placement field.
    pub fn start_board(&self) -> boardsync_core::Result<Snapshot> {
        Snapshot::from_fen(&self.start_fen)
    }

    /// # Errors
    /// Returns `Error::Config` describing the first offending field.
    pub fn validate(&self) -> boardsync_core::Result<()> {
        if self.start_board().is_err() {
            return Err(Error::Config(format!(
                "start_fen is not a valid position: {}",
                self.start_fen
            )));
        }
        if self.search.depth == 0 {
            return Err(Error::Config("search.depth must be positive".to_string()));
        }
        if self.search.multi_pv == 0 {
            return Err(Error::Config("search.multi_pv must be positive".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be positive".to_string()));
        }
        Ok(())
    }
}
