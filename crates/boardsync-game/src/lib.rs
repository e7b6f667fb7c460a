//! Game synchronization on top of a sensor board.
//!
//! This crate plays a chess game between two players, at least one of them
//! moving pieces on a physical board, and keeps the rules position and the
//! board in agreement.
//!
//! # Components
//!
//! - [`rules`]: legality delegate ([`ShakmatyRules`])
//! - [`engine`]: engine trait and the rotating [`EngineAdapter`] pool
//! - [`inbox`]: per-color collection of board move events
//! - [`player`]: human and engine move sources
//! - [`controller`]: the turn loop and board sync ([`GameController`])
//! - [`uci`]: engines running as UCI child processes ([`UciEngine`])
//!
//! ```text
//!  BoardHandle ──BoardEvent──► MoveInbox (per color) ──► HumanPlayer ─┐
//!       ▲                                                             ├─► GameController ──GameEvent──►
//!       └──────────── reset / commit / redetect ──── EnginePlayer ────┘        │
//!                                                                             Rules
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod inbox;
pub mod mock;
pub mod player;
pub mod rules;
pub mod uci;

pub use config::{GameConfig, SearchBudget};
pub use controller::GameController;
pub use engine::{Engine, EngineAdapter, EngineMove, SearchResult};
pub use error::{EngineError, GameError, Result, RulesError};
pub use events::{GameEnd, GameEvent};
pub use inbox::{Completion, InboxHandle, InterruptToken, MoveInbox, Resolution};
pub use player::{EnginePlayer, HumanPlayer, MoveSource, Player, PlayerKind, TurnAction};
pub use rules::{AppliedMove, MoveRequest, Rules, ShakmatyRules, Terminal};
pub use uci::{UciEngine, UciEngineConfig};
